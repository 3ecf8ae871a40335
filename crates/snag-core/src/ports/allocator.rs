//! Allocator port - 希少リソースを払い出す外部システム
//!
//! # 呼び出し順
//! 1. `list_placement_candidates(scope)` で候補（AD など）を列挙
//! 2. 候補ごとに `create_resource(candidate, spec)`
//! 3. 成功したら `describe_resource(id)` で後から割り当てられる属性を取得

use async_trait::async_trait;

use crate::domain::{
    AcquisitionResult, AllocatorError, PlacementCandidate, PlacementScope, ResourceAttributes,
    ResourceId, ResourceSpec,
};

/// Allocator は容量が足りないと一時的に失敗する外部システム
///
/// # 設計原則
/// - 失敗理由は `ReasonCode` に分類して返す（loop は文字列を見ない）
/// - 候補の順序は allocator が決める
#[async_trait]
pub trait Allocator: Send + Sync {
    /// 試す順に並べた候補
    async fn list_placement_candidates(
        &self,
        scope: &PlacementScope,
    ) -> Result<Vec<PlacementCandidate>, AllocatorError>;

    /// create を 1 回投げる。失敗は全部 AcquisitionResult に分類して返す
    async fn create_resource(
        &self,
        candidate: &PlacementCandidate,
        spec: &ResourceSpec,
    ) -> AcquisitionResult;

    /// 作成後に割り当てられる属性（public address など）を取得
    async fn describe_resource(
        &self,
        id: &ResourceId,
    ) -> Result<ResourceAttributes, AllocatorError>;
}
