//! message - 成功通知の本文（Telegram Markdown）

use crate::domain::{PlacementScope, ResourceAttributes, ResourceId, ResourceSpec};

/// region / ID / shape / IP と、IP が分かっていれば ssh コマンドを載せる
pub fn success_message(
    scope: &PlacementScope,
    spec: &ResourceSpec,
    resource_id: &ResourceId,
    attributes: &ResourceAttributes,
) -> String {
    let address = attributes
        .public_address
        .as_deref()
        .filter(|a| !a.is_empty());

    let mut message = format!(
        "🎉 *Instance Created!*\n\n*Region:* {}\n*ID:* `{}`\n*Shape:* {} ({})\n*IP:* `{}`",
        scope.region,
        resource_id,
        spec.shape,
        spec.size_summary(),
        address.unwrap_or("pending..."),
    );
    if let Some(address) = address {
        message.push_str(&format!("\n\nSSH: `ssh ubuntu@{address}`"));
    }
    message
}
