pub mod ms {
    pub const POLL_INTERVAL: u64 = 100;
    pub const LISTENER_POLL: u64 = 500;
    pub const DIALOG_SETTLE: u64 = 100;
}

pub mod secs {
    pub const INITIAL_RENDER: u64 = 5;
    pub const LISTING_POLL: u64 = 1;
    pub const LISTING_READY: u64 = 120;
    pub const PAGE_COUNTER: u64 = 5;
    pub const SCROLL_PAUSE: u64 = 3;
    pub const LISTENER_SETTLE: u64 = 3;
    pub const INTERSTITIAL_POLL: u64 = 1;
    pub const INTERSTITIAL_CLEAR: u64 = 600;
    pub const VISIT: u64 = 30;
    pub const REQUEST: u64 = 120;
}
