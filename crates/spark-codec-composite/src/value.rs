use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// 子编解码器产出的类型擦除值，写访问器负责把它还原为成员的静态类型。
pub type DynValue = Box<dyn Any + Send + Sync>;

/// `ValueType` 标识一个成员的值类型，是注册中心解析子编解码器时使用的键。
///
/// # 设计背景（Why）
/// - 注册中心需要“按类型查找编解码器”，Rust 中最直接的运行期类型身份是 [`TypeId`]；
/// - 单独保留 `type_name` 用于错误信息与结构化诊断输出，`TypeId` 本身不可读。
///
/// # 契约说明（What）
/// - 相等性与哈希只依据 `TypeId`，名字仅用于展示；
/// - 对 `Option<V>` 成员，值类型是 `V` 而非 `Option<V>`：空值由策略处理，不交给子编解码器。
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    /// 取得 `V` 的值类型标识。
    pub fn of<V: Any>() -> Self {
        Self {
            id: TypeId::of::<V>(),
            name: std::any::type_name::<V>(),
        }
    }

    /// 底层 `TypeId`。
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型路径，例如 `alloc::string::String`。
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 去掉模块路径后的短名，例如 `String`、`Vec<u8>`。
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType").field(&self.name).finish()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// 截掉最外层类型的模块路径。
///
/// 泛型参数中的路径保留原样，只在 `<` 之前查找最后一个 `::`。
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let head_end = full.find('<').unwrap_or(full.len());
    match full[..head_end].rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
