//! 成员描述表：复合类型中参与编解码的成员清单。
//!
//! 成员发现（哪些字段参与、叫什么名字、采用何种空值策略）由上游完成，本模块只承载结果。
//! 描述表可以用代码逐条构建，也可以通过 [`CompositeSchema`] 从配置文本加载。

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::options::{DecoderOptions, UnknownKeyPolicy};

/// 线上出现空值标记时，成员应当如何处理。
///
/// # 契约说明（What）
/// - `SetToNull`：通过写访问器写入空值，要求成员字段可空（`Option<V>`），构建期校验；
/// - `KeepDefault`：不触碰成员，保留构造器产出的初始值；
/// - `Prohibit`：立即以 [`DecodeError::NullNotPermitted`](crate::DecodeError::NullNotPermitted)
///   终止解码，错误中携带成员名。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbsentValuePolicy {
    /// 写入空值。
    SetToNull,
    /// 保留默认值。
    #[default]
    KeepDefault,
    /// 拒绝空值。
    Prohibit,
}

impl AbsentValuePolicy {
    /// 配置文本中使用的名字。
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetToNull => "set-to-null",
            Self::KeepDefault => "keep-default",
            Self::Prohibit => "prohibit",
        }
    }
}

impl fmt::Display for AbsentValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个成员的描述：名字、空值策略、值类型是否为集合。
///
/// 描述一经放入解码器即不可变；同一解码器内成员名必须唯一，重复名字在构建期被拒绝。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    name: Cow<'static, str>,
    #[serde(default)]
    policy: AbsentValuePolicy,
    #[serde(default)]
    collection: bool,
}

impl MemberDescriptor {
    /// 以默认策略（[`AbsentValuePolicy::KeepDefault`]）创建描述。
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            policy: AbsentValuePolicy::default(),
            collection: false,
        }
    }

    /// 指定空值策略。
    pub fn with_policy(mut self, policy: AbsentValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 标记成员的值类型本身是集合。
    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }

    /// 成员名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 空值策略。
    pub fn policy(&self) -> AbsentValuePolicy {
        self.policy
    }

    /// 值类型是否为集合。
    pub fn is_collection_valued(&self) -> bool {
        self.collection
    }
}

/// `CompositeSchema` 是可序列化的成员描述表，连同解码选项一起从配置加载。
///
/// # 设计背景（Why）
/// - 成员清单往往由代码生成或部署配置给出，与访问器（编译期确定）分处两地；
/// - 按名字把两者拼合（见 [`CompositeDecoder::from_schema`](crate::CompositeDecoder::from_schema)），
///   就能在不改代码的情况下调整成员顺序、策略或增删参与成员。
///
/// # 配置样例（How）
/// ```toml
/// type_name = "Order"
/// unknown_keys = "reject"
///
/// [[members]]
/// name = "id"
/// policy = "prohibit"
///
/// [[members]]
/// name = "tags"
/// collection = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeSchema {
    /// 诊断输出中使用的类型名；缺省时使用 Rust 类型短名。
    #[serde(default)]
    pub type_name: Option<String>,
    /// 未知键处理策略。
    #[serde(default)]
    pub unknown_keys: UnknownKeyPolicy,
    /// 按声明顺序排列的成员。
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
}

impl CompositeSchema {
    /// 由成员列表创建，其他字段取默认值。
    pub fn new(members: Vec<MemberDescriptor>) -> Self {
        Self {
            members,
            ..Self::default()
        }
    }

    /// 从 TOML 文本加载。
    #[cfg(feature = "schema-toml")]
    pub fn from_toml_str(text: &str) -> Result<Self, crate::ConfigError> {
        toml::from_str(text).map_err(|err| crate::ConfigError::InvalidSchema {
            detail: err.to_string(),
        })
    }

    /// 提取解码选项。
    pub fn options(&self) -> DecoderOptions {
        DecoderOptions {
            unknown_keys: self.unknown_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_keep_members_untouched() {
        let member = MemberDescriptor::new("a");
        assert_eq!(member.policy(), AbsentValuePolicy::KeepDefault);
        assert!(!member.is_collection_valued());
    }

    #[cfg(feature = "schema-toml")]
    #[test]
    fn schema_loads_from_toml() {
        let schema = CompositeSchema::from_toml_str(
            r#"
            type_name = "Order"
            unknown_keys = "reject"

            [[members]]
            name = "id"
            policy = "prohibit"

            [[members]]
            name = "note"
            policy = "set-to-null"

            [[members]]
            name = "tags"
            collection = true
            "#,
        )
        .expect("schema should parse");

        assert_eq!(schema.type_name.as_deref(), Some("Order"));
        assert_eq!(schema.options().unknown_keys, UnknownKeyPolicy::Reject);
        assert_eq!(schema.members.len(), 3);
        assert_eq!(schema.members[0].policy(), AbsentValuePolicy::Prohibit);
        assert_eq!(schema.members[1].policy(), AbsentValuePolicy::SetToNull);
        assert!(schema.members[2].is_collection_valued());
        assert_eq!(schema.members[2].policy(), AbsentValuePolicy::KeepDefault);
    }

    #[cfg(feature = "schema-toml")]
    #[test]
    fn schema_rejects_unknown_policy() {
        let err = CompositeSchema::from_toml_str(
            r#"
            [[members]]
            name = "id"
            policy = "sometimes"
            "#,
        )
        .expect_err("unknown policy must fail");
        assert_eq!(err.code(), crate::error::codes::CONFIG_INVALID_SCHEMA);
    }
}
