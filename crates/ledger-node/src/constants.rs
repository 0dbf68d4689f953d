/// A bare port binds every interface, as `:PORT` did for the original server.
pub(crate) const DEFAULT_ADDR: &str = "8080";
pub(crate) const DEFAULT_MINE_TIMEOUT_SECS: u64 = 60;
pub(crate) const UNSPECIFIED_HOST: &str = "0.0.0.0";
