//! App - アプリケーション層
//!
//! ports を組み合わせて acquisition loop を実装します。
//!
//! # 主要コンポーネント
//! - **LoopBuilder**: 依存のワイヤリングと起動時検証
//! - **AcquisitionLoop**: attempt → 候補を順に create → 成功/中断/再試行
//! - **address**: 作成後に割り当てられる public address の bounded polling
//! - **message**: 成功通知の本文

pub mod builder;
pub mod acquisition_loop;
pub mod address;
pub mod message;

#[cfg(test)]
pub(crate) mod testing;

pub use self::builder::{BuildError, LoopBuilder};
pub use self::acquisition_loop::{AcquisitionLoop, LoopError};
