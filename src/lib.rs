pub mod config;
pub mod generator;
pub mod proto {
    pub mod bid;
}
pub mod capture {
    pub mod record;
    pub mod sealed;
}
pub mod validate {
    pub mod ad;
    pub mod classifier;
    pub mod issue;
    pub mod template;
}
pub mod render {
    pub mod escape;
    pub mod macros;
    pub mod snippet;
}
pub mod report;
pub mod requester;
pub mod sender;
