//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义复合解码器在“配置期”与“解码期”两个阶段可能出现的错误，二者生命周期截然不同：
//!   配置期错误在构建时立即暴露且永不恢复，解码期错误只终止当前一次 `decode` 调用；
//! - 每个变体都映射到 [`codes`] 中的稳定错误码，便于日志、指标按码聚合，与 `protocol.decode`
//!   一类点分命名保持一致。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`，满足 `Send + Sync + 'static`；
//! - 解码期错误携带成员名或上下文文本，调用方无需再拼接现场信息；
//! - “未知键”在默认策略下并非错误，仅在 [`UnknownKeyPolicy::Reject`](crate::UnknownKeyPolicy::Reject)
//!   时才会以 [`DecodeError::UnknownKey`] 形式出现。

use thiserror::Error;

/// 稳定错误码集合。
///
/// 命名沿用 `<域>.<语义>` 的点分风格；码值一经发布不得修改，只允许追加。
pub mod codes {
    /// 目标类型缺少零参数构造器。
    pub const CONFIG_MISSING_CONSTRUCTOR: &str = "composite.config.missing_constructor";
    /// 成员名重复。
    pub const CONFIG_DUPLICATE_MEMBER: &str = "composite.config.duplicate_member";
    /// 描述表中的成员在访问器目录里找不到对应条目。
    pub const CONFIG_UNBOUND_MEMBER: &str = "composite.config.unbound_member";
    /// `SetToNull` 策略绑定到了不可为空的成员。
    pub const CONFIG_NULLABILITY_MISMATCH: &str = "composite.config.nullability_mismatch";
    /// 注册中心无法为成员类型提供子编解码器。
    pub const CONFIG_UNRESOLVED_TYPE: &str = "composite.config.unresolved_type";
    /// 成员的集合标记与其子编解码器不一致。
    pub const CONFIG_COLLECTION_MISMATCH: &str = "composite.config.collection_mismatch";
    /// 成员描述表文本无法解析。
    pub const CONFIG_INVALID_SCHEMA: &str = "composite.config.invalid_schema";
    /// 注册中心拒绝重复注册。
    pub const REGISTRY_DUPLICATE: &str = "composite.registry.duplicate";
    /// 位置序列的条目数与成员数不一致。
    pub const DECODE_ITEM_COUNT_MISMATCH: &str = "composite.decode.item_count_mismatch";
    /// 游标在读取成员途中耗尽。
    pub const DECODE_STREAM_EXHAUSTED: &str = "composite.decode.stream_exhausted";
    /// 成员策略为 `Prohibit` 却收到了空值标记。
    pub const DECODE_NULL_NOT_PERMITTED: &str = "composite.decode.null_not_permitted";
    /// 严格模式下遇到未声明的键。
    pub const DECODE_UNKNOWN_KEY: &str = "composite.decode.unknown_key";
    /// 当前令牌与期望形态不符。
    pub const DECODE_UNEXPECTED_TOKEN: &str = "composite.decode.unexpected_token";
    /// 子编解码器产出的值与成员静态类型不符。
    pub const DECODE_TYPE_MISMATCH: &str = "composite.decode.type_mismatch";
    /// 数值超出目标类型的表示范围。
    pub const DECODE_NUMERIC_OVERFLOW: &str = "composite.decode.numeric_overflow";
    /// 底层字节流格式损坏。
    pub const DECODE_MALFORMED: &str = "composite.decode.malformed";
}

/// 注册中心错误。
///
/// 对复合解码器而言是不透明的：解析子编解码器失败时原样包进 [`ConfigError::Registry`]。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// 注册中心没有为该类型登记任何编解码器。
    #[error("no codec registered for type `{type_name}`")]
    UnsupportedType {
        /// 被请求的类型名。
        type_name: &'static str,
    },
    /// 同一类型被重复注册。
    #[error("codec for type `{type_name}` is already registered")]
    DuplicateRegistration {
        /// 冲突的类型名。
        type_name: &'static str,
    },
}

impl RegistryError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedType { .. } => codes::CONFIG_UNRESOLVED_TYPE,
            Self::DuplicateRegistration { .. } => codes::REGISTRY_DUPLICATE,
        }
    }
}

/// 配置期错误：在构建 [`CompositeDecoder`](crate::CompositeDecoder) 时立即暴露，永不恢复。
///
/// # 教案式说明
/// - **意图 (Why)**：把“类型不可构造”“成员名冲突”“类型无解码器”等结构性问题挡在第一次解码之前，
///   让错误在部署或启动阶段就被发现；
/// - **契约 (What)**：变体均携带足以定位问题的成员名或类型名；
/// - **风险 (Trade-offs)**：`Registry` 变体会保留注册中心原始错误，调用方可通过
///   [`std::error::Error::source`] 继续下钻。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 目标类型未提供零参数构造器。
    #[error("composite type `{type_name}` has no zero-argument constructor")]
    MissingConstructor {
        /// 目标类型名。
        type_name: String,
    },
    /// 两个成员使用了相同的名字。
    #[error("member name `{name}` is declared more than once")]
    DuplicateMember {
        /// 重复的成员名。
        name: String,
    },
    /// 描述表中的成员没有可用的访问器。
    #[error("member `{name}` has no accessor in the catalog of `{type_name}`")]
    UnboundMember {
        /// 成员名。
        name: String,
        /// 目标类型名。
        type_name: String,
    },
    /// `SetToNull` 策略要求成员可空，但访问器指向的是非 `Option` 字段。
    #[error("member `{name}` uses policy set-to-null but its field cannot hold null")]
    NullabilityMismatch {
        /// 成员名。
        name: String,
    },
    /// 注册中心无法为成员的值类型提供子编解码器。
    #[error("cannot resolve codec for member `{member}`: {source}")]
    Registry {
        /// 成员名。
        member: String,
        /// 注册中心给出的原始错误。
        #[source]
        source: RegistryError,
    },
    /// 描述表声明的集合标记与解析到的子编解码器不符。
    #[error("member `{name}` is declared {declared} but resolves to codec `{codec}`")]
    CollectionMismatch {
        /// 成员名。
        name: String,
        /// 描述表的声明，`"collection-valued"` 或 `"scalar-valued"`。
        declared: &'static str,
        /// 子编解码器的扁平描述。
        codec: String,
    },
    /// 成员描述表文本解析失败。
    #[error("invalid composite schema: {detail}")]
    InvalidSchema {
        /// 解析器给出的说明。
        detail: String,
    },
}

impl ConfigError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingConstructor { .. } => codes::CONFIG_MISSING_CONSTRUCTOR,
            Self::DuplicateMember { .. } => codes::CONFIG_DUPLICATE_MEMBER,
            Self::UnboundMember { .. } => codes::CONFIG_UNBOUND_MEMBER,
            Self::NullabilityMismatch { .. } => codes::CONFIG_NULLABILITY_MISMATCH,
            Self::Registry { source, .. } => source.code(),
            Self::CollectionMismatch { .. } => codes::CONFIG_COLLECTION_MISMATCH,
            Self::InvalidSchema { .. } => codes::CONFIG_INVALID_SCHEMA,
        }
    }
}

/// 解码期错误：只终止当前一次解码调用，不做重试也不降级，部分填充的实例随之丢弃。
///
/// # 教案式说明
/// - **意图 (Why)**：对应形态不符、流提前结束、空值被禁止三类致命问题，以及叶子编解码器
///   上报的令牌、类型、数值错误；
/// - **契约 (What)**：`NullNotPermitted` 一定携带触发的成员名；`ItemCountMismatch` 的
///   `expected` 恒为成员数；
/// - **风险 (Trade-offs)**：成员名以 `String` 保存，错误路径上有一次分配，热路径不受影响。
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DecodeError {
    /// 位置序列报告的条目数与成员数不一致。
    #[error("positional container holds {actual} items but {expected} members are declared")]
    ItemCountMismatch {
        /// 声明的成员数。
        expected: usize,
        /// 游标报告的条目数。
        actual: usize,
    },
    /// 游标在需要更多令牌时已经耗尽。
    #[error("stream ended prematurely while reading {context}")]
    StreamExhausted {
        /// 正在读取的位置，通常是成员名。
        context: String,
    },
    /// 成员策略为 `Prohibit`，却收到了空值标记。
    #[error("member `{member}` does not permit the absent-value marker")]
    NullNotPermitted {
        /// 触发错误的成员名。
        member: String,
    },
    /// 严格模式下遇到未声明的键。
    #[error("key `{key}` does not name any declared member")]
    UnknownKey {
        /// 未知键。
        key: String,
    },
    /// 当前令牌不是期望的形态。
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// 期望的令牌种类。
        expected: &'static str,
        /// 实际遇到的令牌种类。
        found: &'static str,
    },
    /// 子编解码器产出的值无法写入成员的静态类型。
    #[error("member `{member}` expects a value of type `{expected}`")]
    TypeMismatch {
        /// 成员名。
        member: String,
        /// 成员声明的类型名。
        expected: &'static str,
    },
    /// 数值超出目标类型的表示范围。
    #[error("numeric value does not fit into `{target}`")]
    NumericOverflow {
        /// 目标类型名。
        target: &'static str,
    },
    /// 底层字节流格式损坏。
    #[error("malformed input: {detail}")]
    Malformed {
        /// 解析器给出的说明。
        detail: String,
    },
}

impl DecodeError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::ItemCountMismatch { .. } => codes::DECODE_ITEM_COUNT_MISMATCH,
            Self::StreamExhausted { .. } => codes::DECODE_STREAM_EXHAUSTED,
            Self::NullNotPermitted { .. } => codes::DECODE_NULL_NOT_PERMITTED,
            Self::UnknownKey { .. } => codes::DECODE_UNKNOWN_KEY,
            Self::UnexpectedToken { .. } => codes::DECODE_UNEXPECTED_TOKEN,
            Self::TypeMismatch { .. } => codes::DECODE_TYPE_MISMATCH,
            Self::NumericOverflow { .. } => codes::DECODE_NUMERIC_OVERFLOW,
            Self::Malformed { .. } => codes::DECODE_MALFORMED,
        }
    }

    /// 构造 `StreamExhausted`。
    pub fn exhausted(context: impl Into<String>) -> Self {
        Self::StreamExhausted {
            context: context.into(),
        }
    }

    /// 构造 `Malformed`。
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }
}
