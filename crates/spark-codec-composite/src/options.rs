use serde::{Deserialize, Serialize};

/// 键值映射中出现未声明键时的处理策略。
///
/// - `Skip`：在游标上跳过对应的值并继续，属于有意的宽松策略，默认启用；
/// - `Reject`：以 [`DecodeError::UnknownKey`](crate::DecodeError::UnknownKey) 终止解码。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownKeyPolicy {
    /// 跳过未知键。
    #[default]
    Skip,
    /// 拒绝未知键。
    Reject,
}

/// 复合解码器的运行选项，构建后随解码器一起冻结。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderOptions {
    /// 未知键策略。
    #[serde(default)]
    pub unknown_keys: UnknownKeyPolicy,
}

impl DecoderOptions {
    /// 默认选项：跳过未知键。
    pub fn lenient() -> Self {
        Self::default()
    }

    /// 严格选项：拒绝未知键。
    pub fn strict() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::Reject,
        }
    }
}
