pub(crate) mod browse;
pub(crate) mod mark;
pub(crate) mod notify;
pub(crate) mod recipients;
pub(crate) mod serve;
pub(crate) mod watch;
