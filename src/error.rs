use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
///
/// Unresolvable types, missing descriptions and cyclic type graphs are not
/// errors: they degrade the produced tree and are only logged.
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// A source file is not valid Rust
    ParseError { file: PathBuf, message: String },
    SerializationError(String),
    ConfigError(String),
    /// The build was abandoned through its cancel token or deadline
    Cancelled,
    /// Submitting a payload to an external API catalog failed
    UploadError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO 错误: {}", e),
            Error::ParseError { file, message } => {
                write!(f, "解析错误 {}: {}", file.display(), message)
            }
            Error::SerializationError(msg) => write!(f, "序列化错误: {}", msg),
            Error::ConfigError(msg) => write!(f, "配置错误: {}", msg),
            Error::Cancelled => write!(f, "文档生成已取消"),
            Error::UploadError(msg) => write!(f, "上传失败: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON 序列化错误: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML 序列化错误: {}", err))
    }
}
