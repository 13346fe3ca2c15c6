//! # 访问器编译器
//!
//! ## 核心意图（Why）
//! - 复合解码器需要对“任意结构体”逐字段读写，却不能为每个类型手写解码逻辑；
//! - Rust 没有运行期反射，本模块用 `fn` 指针表替代：每个成员一对读/写函数，在配置期按成员
//!   描述表的顺序编译成与其他成员表下标对齐的数组，之后只读共享。
//!
//! ## 行为契约（What）
//! - [`AccessorCatalog`] 以名字登记目标类型全部可访问的字段；
//! - [`compile_accessors`] 按描述表顺序从目录取出访问器，缺失即 [`ConfigError::UnboundMember`]，
//!   `SetToNull` 绑定到不可空字段即 [`ConfigError::NullabilityMismatch`]；
//! - 写访问器接收 [`DynValue`]，下转型失败返回 [`AccessError::TypeMismatch`]，由解码器补上成员名。
//!
//! ## 风险提示（Trade-offs）
//! - 每次写入多一次 `Box` 下转型与一次移动，换取“一个解码器服务所有类型”的统一实现；
//! - 目录按名字查找只发生在配置期，解码热路径只走下标。

use std::any::Any;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::{AbsentValuePolicy, MemberDescriptor};
use crate::error::ConfigError;
use crate::value::{DynValue, ValueType};

/// 零参数构造器：为每次解码分配一个默认初始化的新实例。
pub type Constructor<T> = fn() -> T;

/// 编译后的单个成员访问器。
pub type Accessor<T> = Arc<dyn MemberAccess<T>>;

/// 写访问器失败的原因，不携带成员名。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessError {
    /// 值的动态类型与成员的静态类型不符。
    TypeMismatch {
        /// 成员声明的类型名。
        expected: &'static str,
    },
    /// 成员字段不可为空。
    NotNullable,
}

/// `MemberAccess` 描述对目标类型 `T` 某一成员的读写能力。
///
/// # 教案式说明
/// - **意图 (Why)**：把“如何取到字段”从解码算法中抽离，解码器只面对统一的对象安全接口；
/// - **契约 (What)**：
///   - `value_type` 是注册中心的查询键，对 `Option<V>` 字段返回 `V`；
///   - `read` 返回当前值的只读视图，可空字段为 `None` 时返回 `None`；
///   - `write` 必须把值转换为字段的静态类型后写入，转换失败返回错误且不修改字段；
///   - `clear` 仅对可空字段成功；
/// - **扩展 (How)**：内置实现覆盖普通字段与 `Option` 字段；数组槽位、嵌套路径等可自行实现本 trait。
pub trait MemberAccess<T>: Send + Sync {
    /// 成员的值类型。
    fn value_type(&self) -> ValueType;

    /// 成员是否能够保存空值。
    fn is_nullable(&self) -> bool;

    /// 读取当前值。
    fn read<'a>(&self, target: &'a T) -> Option<&'a (dyn Any + Send + Sync)>;

    /// 写入新值。
    fn write(&self, target: &mut T, value: DynValue) -> Result<(), AccessError>;

    /// 写入空值。
    fn clear(&self, target: &mut T) -> Result<(), AccessError>;
}

/// 普通字段 `V` 的访问器。
pub struct FieldAccess<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T, V> FieldAccess<T, V> {
    /// 由一对投影函数创建。
    pub fn new(get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
        Self { get, get_mut }
    }
}

impl<T, V> MemberAccess<T> for FieldAccess<T, V>
where
    V: Any + Send + Sync,
{
    fn value_type(&self) -> ValueType {
        ValueType::of::<V>()
    }

    fn is_nullable(&self) -> bool {
        false
    }

    fn read<'a>(&self, target: &'a T) -> Option<&'a (dyn Any + Send + Sync)> {
        Some((self.get)(target))
    }

    fn write(&self, target: &mut T, value: DynValue) -> Result<(), AccessError> {
        let value = downcast::<V>(value)?;
        *(self.get_mut)(target) = value;
        Ok(())
    }

    fn clear(&self, _target: &mut T) -> Result<(), AccessError> {
        Err(AccessError::NotNullable)
    }
}

/// 可空字段 `Option<V>` 的访问器。
pub struct NullableFieldAccess<T, V> {
    get: fn(&T) -> &Option<V>,
    get_mut: fn(&mut T) -> &mut Option<V>,
}

impl<T, V> NullableFieldAccess<T, V> {
    /// 由一对投影函数创建。
    pub fn new(get: fn(&T) -> &Option<V>, get_mut: fn(&mut T) -> &mut Option<V>) -> Self {
        Self { get, get_mut }
    }
}

impl<T, V> MemberAccess<T> for NullableFieldAccess<T, V>
where
    V: Any + Send + Sync,
{
    fn value_type(&self) -> ValueType {
        ValueType::of::<V>()
    }

    fn is_nullable(&self) -> bool {
        true
    }

    fn read<'a>(&self, target: &'a T) -> Option<&'a (dyn Any + Send + Sync)> {
        (self.get)(target)
            .as_ref()
            .map(|value| value as &(dyn Any + Send + Sync))
    }

    fn write(&self, target: &mut T, value: DynValue) -> Result<(), AccessError> {
        let value = downcast::<V>(value)?;
        *(self.get_mut)(target) = Some(value);
        Ok(())
    }

    fn clear(&self, target: &mut T) -> Result<(), AccessError> {
        *(self.get_mut)(target) = None;
        Ok(())
    }
}

fn downcast<V: Any>(value: DynValue) -> Result<V, AccessError> {
    value
        .downcast::<V>()
        .map(|boxed| *boxed)
        .map_err(|_| AccessError::TypeMismatch {
            expected: std::any::type_name::<V>(),
        })
}

/// `AccessorCatalog` 以成员名登记目标类型的全部字段访问器。
///
/// # 使用方式（How）
/// ```
/// use spark_codec_composite::AccessorCatalog;
///
/// #[derive(Default)]
/// struct Point {
///     x: i64,
///     label: Option<String>,
/// }
///
/// let catalog = AccessorCatalog::<Point>::new()
///     .field("x", |p| &p.x, |p| &mut p.x)
///     .nullable_field("label", |p| &p.label, |p| &mut p.label);
/// assert_eq!(catalog.len(), 2);
/// ```
///
/// 目录只是“候选集合”：真正参与解码的成员及其顺序由描述表决定。
pub struct AccessorCatalog<T> {
    entries: BTreeMap<Cow<'static, str>, Accessor<T>>,
}

impl<T: 'static> AccessorCatalog<T> {
    /// 创建空目录。
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// 登记普通字段。
    pub fn field<V>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self
    where
        V: Any + Send + Sync,
    {
        self.insert(name, Arc::new(FieldAccess::new(get, get_mut)));
        self
    }

    /// 登记可空字段。
    pub fn nullable_field<V>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&T) -> &Option<V>,
        get_mut: fn(&mut T) -> &mut Option<V>,
    ) -> Self
    where
        V: Any + Send + Sync,
    {
        self.insert(name, Arc::new(NullableFieldAccess::new(get, get_mut)));
        self
    }

    /// 登记自定义访问器，返回被替换的旧条目。
    pub fn insert(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        accessor: Accessor<T>,
    ) -> Option<Accessor<T>> {
        self.entries.insert(name.into(), accessor)
    }

    /// 按名字查找。
    pub fn get(&self, name: &str) -> Option<&Accessor<T>> {
        self.entries.get(name)
    }

    /// 条目数量。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 目录是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: 'static> Default for AccessorCatalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AccessorCatalog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// 按描述表顺序编译访问器数组，结果与描述表下标一一对齐。
pub fn compile_accessors<T: 'static>(
    members: &[MemberDescriptor],
    catalog: &AccessorCatalog<T>,
    type_name: &str,
) -> Result<Vec<Accessor<T>>, ConfigError> {
    members
        .iter()
        .map(|member| {
            let accessor = catalog
                .get(member.name())
                .ok_or_else(|| ConfigError::UnboundMember {
                    name: member.name().to_string(),
                    type_name: type_name.to_string(),
                })?;
            if member.policy() == AbsentValuePolicy::SetToNull && !accessor.is_nullable() {
                return Err(ConfigError::NullabilityMismatch {
                    name: member.name().to_string(),
                });
            }
            Ok(Arc::clone(accessor))
        })
        .collect()
}

/// 校验并取出构造器；缺失即配置失败，绝不产出空工厂。
pub fn require_constructor<T>(
    constructor: Option<Constructor<T>>,
    type_name: &str,
) -> Result<Constructor<T>, ConfigError> {
    constructor.ok_or_else(|| ConfigError::MissingConstructor {
        type_name: String::from(type_name),
    })
}
