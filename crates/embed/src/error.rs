
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbedError {
    #[error("Invalid value {:?} for embed attribute `{}`", .value, .field)]
    InvalidConfig {
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Embed target {:?} is not an http(s) URL", .0)]
    InvalidTarget(String),
}
