//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! loop は trait だけに依存し、クラウド API・ファイル・チャット通知の
//! 実装の詳細は `impls` に閉じ込めます。
//!
//! # 設計原則
//! - Allocator が失敗理由を `ReasonCode` で分類して返す
//! - StateStore は冪等（load → save → load で同じ値）
//! - Notifier は best-effort（失敗は loop に伝播させない）

pub mod allocator;
pub mod state_store;
pub mod notifier;
pub mod clock;
pub mod id_generator;

pub use self::allocator::Allocator;
pub use self::state_store::StateStore;
pub use self::notifier::Notifier;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
