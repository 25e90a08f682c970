//! NNTP (Network News Transfer Protocol) client implementation.
//!
//! Implements the subset of NNTP needed to read news:
//! - Connection and greeting ([RFC 3977 §5.1](https://datatracker.ietf.org/doc/html/rfc3977#section-5.1))
//! - Authentication via AUTHINFO USER/PASS ([RFC 4643 §2.3](https://datatracker.ietf.org/doc/html/rfc4643#section-2.3))
//! - ARTICLE, HEAD, STAT, GROUP ([RFC 3977 §6](https://datatracker.ietf.org/doc/html/rfc3977#section-6))
//! - LIST OVERVIEW.FMT and XOVER ([RFC 3977 §8](https://datatracker.ietf.org/doc/html/rfc3977#section-8)),
//!   plus the zlib-compressed XZVER variant
//! - Multi-line response framing with dot-unstuffing ([RFC 3977 §3.1.1](https://datatracker.ietf.org/doc/html/rfc3977#section-3.1.1))
//!
//! Responses flow through a per-command [`ResponsePipeline`]; the
//! [`NntpSession`] allows only one command in flight per connection.

pub mod decompress;
mod error;
pub mod framer;
mod model;
pub mod parser;
pub mod pipeline;
mod reply;
mod session;
mod transport;

pub use crate::decompress::Decompressor;
pub use crate::error::{ErrorKind, NntpError};
pub use crate::framer::{MultilineFramer, StatusLineSplitter};
pub use crate::model::{
    Article, ArticleHead, ArticleStat, ConnectionState, Encryption, GroupInfo, NewsServer,
    OverviewField, OverviewFormat, OverviewRow, Response,
};
pub use crate::parser::{ResponseMode, ResponseParser, parse_status_line};
pub use crate::pipeline::{ResponsePipeline, ResponseShape};
pub use crate::reply::{parse_overview_format, parse_overview_line};
pub use crate::session::NntpSession;
pub use crate::transport::{NntpIo, build_tls_config};
