//! snag-core
//!
//! Core building blocks for snag: a bounded-retry loop that keeps asking a
//! capacity-constrained allocator for one scarce instance until it gets one.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, attempt, candidate, resource, spec, outcome, errors）
//! - **ports**: 抽象化レイヤー（Allocator, StateStore, Notifier, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, acquisition_loop, address, message）
//! - **impls**: 実装（JSON ファイル state, Telegram 通知, OCI CLI allocator など）
//! - **config**: 起動時に読み込む設定
//! - **observability**: tracing の初期化

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
pub mod config;
pub mod observability;
