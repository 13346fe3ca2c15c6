//! 子编解码器契约与内置实现。
//!
//! - [`ValueCodec`]：从游标当前位置解码恰好一个值，是复合解码器与叶子编解码器共同的对象安全接口；
//! - [`StructuralDescribe`]：可选能力，支持递归结构化诊断输出；
//! - [`primitives`]：布尔、整数、浮点、字符串、字节等叶子编解码器；
//! - [`ListCodec`]：集合型成员使用的同构列表编解码器。

use std::borrow::Cow;
use std::fmt;

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::value::{DynValue, ValueType};

mod list;
pub mod primitives;

pub use list::ListCodec;

/// `ValueCodec` 是对象层的单值解码契约。
///
/// # 设计初衷（Why）
/// - 注册中心要以 trait 对象存放各种值类型的编解码器，因此接口必须对象安全，结果以
///   [`DynValue`] 类型擦除返回，由成员写访问器还原；
/// - 复合解码器本身也实现该 trait，于是嵌套结构只需把内层解码器注册进同一个注册中心。
///
/// # 契约说明（What）
/// - **前置条件**：进入 `decode_value` 时，值的首个令牌已是游标当前令牌，且不是空值标记
///   （空值由调用方按成员策略处理）；
/// - **后置条件**：成功返回时，值的最后一个令牌是游标当前令牌；返回值的动态类型必须等于
///   [`ValueCodec::value_type`]；
/// - **诊断**：`label` 提供扁平文本描述；支持递归描述的实现通过 `as_structural` 暴露能力，
///   默认返回 `None`，结构化输出即回退到 `label`。
///
/// # 风险提示（Trade-offs）
/// - 每个值一次装箱；对极致性能场景应直接使用具体类型的泛型解码，而不是对象层。
pub trait ValueCodec: Send + Sync + 'static {
    /// 产出值的类型。
    fn value_type(&self) -> ValueType;

    /// 从游标当前位置解码一个值。
    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError>;

    /// 扁平文本描述。
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.value_type().short_name())
    }

    /// 产出值是否为同构集合，构建期据此校验成员描述的集合标记。
    fn is_collection(&self) -> bool {
        false
    }

        /// 递归描述能力查询。
    fn as_structural(&self) -> Option<&dyn StructuralDescribe> {
        None
    }
}

impl fmt::Debug for dyn ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueCodec").field(&self.label()).finish()
    }
}

/// 可递归渲染自身组成的编解码器能力。
///
/// `depth` 只影响缩进；实现负责先写出自身标题行（不带缩进，调用方已就位），再以 `depth + 1`
/// 的缩进写出各组成部分。
pub trait StructuralDescribe {
    /// 写出结构化描述。
    fn describe(&self, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result;
}
