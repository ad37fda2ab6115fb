//! HoopsRAG - question answering over basketball box scores
//!
//! # Architecture
//!
//! ```text
//! CSV -> Record reader -> Normalizer -> Embedder -> Index
//!                                                    |
//! Question -> Embedder -> Retriever <----------------+
//!                             |
//!                     Answer Generator -> LLM
//!                             |
//!                          Answer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use hoopsrag_lib::{config::Config, session::Session};
//!
//! let config = Config::load(None)?;
//! let mut session = Session::start(config)?;
//!
//! let reply = session.ask("Jayson Tatum kaç sayı attı?", None)?;
//! println!("{}", reply.answer);
//! ```

pub mod config;
pub mod embed;
pub mod error;
pub mod generate;
pub mod normalize;
pub mod record;
pub mod search;
pub mod session;
pub mod store;

pub use error::{Error, Result};
