//! # CompositeDecoder：形态分派的复合值解码器
//!
//! ## 核心意图（Why）
//! - 对任意“成员固定、有名有序”的结构体，统一地从位置序列或键值映射重建实例，
//!   不为具体类型生成任何专用逻辑；
//! - 配置期一次性完成访问器编译、子编解码器解析、名字索引构建，得到下标对齐的只读成员表；
//!   解码期只读这些表，因此同一个解码器可在多线程上并发解码（每个调用各持游标与目标实例）。
//!
//! ## 行为契约（What）
//! - **位置序列**：若报告了条目数且不等于成员数，在构造任何实例之前即以
//!   [`DecodeError::ItemCountMismatch`] 失败；否则按声明顺序逐个成员读取，令牌不足即
//!   [`DecodeError::StreamExhausted`]；
//! - **键值映射**：逐对读取，按名字索引定位成员；未知键依 [`UnknownKeyPolicy`] 跳过或拒绝；
//!   从未出现的成员保留构造器给出的初值；
//! - **空值标记**：两种形态共用同一套三分支策略（写空 / 保留 / 拒绝）；
//! - 任何解码期错误都终止本次调用，部分填充的实例随之丢弃，不做重试。
//!
//! ## 风险提示（Trade-offs）
//! - 名字索引查找位于键值解码热路径，使用哈希表；位置解码只走下标；
//! - 子编解码器以 `Arc<dyn ValueCodec>` 共享，每个成员值一次装箱与一次下转型。

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::accessor::{
    AccessError, Accessor, AccessorCatalog, Constructor, compile_accessors, require_constructor,
};
use crate::codec::{StructuralDescribe, ValueCodec};
use crate::cursor::{ContainerKind, Cursor, Token, unexpected};
use crate::descriptor::{AbsentValuePolicy, CompositeSchema, MemberDescriptor};
use crate::error::{ConfigError, DecodeError};
use crate::index::NameIndex;
use crate::options::{DecoderOptions, UnknownKeyPolicy};
use crate::registry::{CodecRegistry, resolve_member_codecs};
use crate::value::{DynValue, ValueType, short_type_name};

/// 面向目标类型 `T` 的复合值解码器。
///
/// # 教案式说明
/// - **意图 (Why)**：把“成员描述表 + 访问器 + 子编解码器”三张下标对齐的表与一个零参数构造器
///   组合成一个可复用、不可变的解码器；
/// - **契约 (What)**：
///   - `members`、`accessors`、`codecs` 长度恒等于成员数，第 `i` 项描述同一成员；
///   - 每次 [`decode`](Self::decode) 用构造器新建一个实例并逐成员填充，实例与其他调用互不相干；
///   - 解码器本身实现 [`ValueCodec`]，可注册进注册中心作为其他复合类型的子编解码器；
/// - **风险 (Trade-offs)**：结构化诊断（[`StructuralDescribe`]）不做环检测，自引用的编解码器图
///   会无限递归，这是已知限制。
///
/// # 示例
/// ```
/// use spark_codec_composite::{
///     AbsentValuePolicy, CompositeDecoder, InMemoryCodecRegistry, MemberDescriptor, Token,
///     TokenCursor,
/// };
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Pair {
///     a: Option<i64>,
///     b: i64,
/// }
///
/// let registry = InMemoryCodecRegistry::with_primitives();
/// let decoder = CompositeDecoder::<Pair>::builder()
///     .nullable_field(
///         MemberDescriptor::new("a").with_policy(AbsentValuePolicy::SetToNull),
///         |p| &p.a,
///         |p| &mut p.a,
///     )
///     .field(
///         MemberDescriptor::new("b").with_policy(AbsentValuePolicy::Prohibit),
///         |p| &p.b,
///         |p| &mut p.b,
///     )
///     .default_constructor()
///     .build(&registry)
///     .expect("valid configuration");
///
/// let mut cursor = TokenCursor::new([Token::Seq(Some(2)), Token::Nil, Token::UInt(5)]);
/// let pair = decoder.decode(&mut cursor).expect("well formed");
/// assert_eq!(pair, Pair { a: None, b: 5 });
/// ```
pub struct CompositeDecoder<T> {
    type_name: Cow<'static, str>,
    members: Box<[MemberDescriptor]>,
    accessors: Box<[Accessor<T>]>,
    codecs: Box<[Arc<dyn ValueCodec>]>,
    index: NameIndex,
    constructor: Constructor<T>,
    options: DecoderOptions,
}

impl<T: 'static> CompositeDecoder<T> {
    /// 创建构建器。
    pub fn builder() -> CompositeDecoderBuilder<T> {
        CompositeDecoderBuilder::new()
    }

    /// 由成员描述表、访问器目录与构造器直接构建，使用默认选项。
    pub fn build(
        members: Vec<MemberDescriptor>,
        catalog: &AccessorCatalog<T>,
        constructor: Option<Constructor<T>>,
        registry: &dyn CodecRegistry,
    ) -> Result<Self, ConfigError> {
        Self::assemble(
            None,
            members,
            catalog,
            constructor,
            DecoderOptions::default(),
            registry,
        )
    }

    /// 由可序列化的 [`CompositeSchema`] 构建，成员按名字绑定到目录中的访问器。
    pub fn from_schema(
        schema: &CompositeSchema,
        catalog: &AccessorCatalog<T>,
        constructor: Option<Constructor<T>>,
        registry: &dyn CodecRegistry,
    ) -> Result<Self, ConfigError> {
        Self::assemble(
            schema.type_name.clone().map(Cow::Owned),
            schema.members.clone(),
            catalog,
            constructor,
            schema.options(),
            registry,
        )
    }

    fn assemble(
        type_name: Option<Cow<'static, str>>,
        members: Vec<MemberDescriptor>,
        catalog: &AccessorCatalog<T>,
        constructor: Option<Constructor<T>>,
        options: DecoderOptions,
        registry: &dyn CodecRegistry,
    ) -> Result<Self, ConfigError> {
        let type_name =
            type_name.unwrap_or_else(|| Cow::Borrowed(short_type_name(std::any::type_name::<T>())));
        let constructor = require_constructor(constructor, &type_name)?;
        let index = NameIndex::build(members.iter().map(MemberDescriptor::name))?;
        let accessors = compile_accessors(&members, catalog, &type_name)?;
        let codecs = resolve_member_codecs(&members, &accessors, registry)?;

        debug!(
            target_type = %type_name,
            members = members.len(),
            unknown_keys = ?options.unknown_keys,
            "composite decoder built"
        );

        Ok(Self {
            type_name,
            members: members.into_boxed_slice(),
            accessors: accessors.into_boxed_slice(),
            codecs: codecs.into_boxed_slice(),
            index,
            constructor,
            options,
        })
    }

    /// 从游标读取下一个值并解码为 `T`。
    ///
    /// 游标先前进一步，新的当前令牌必须是位置序列或键值映射的容器头。
    pub fn decode(&self, cursor: &mut dyn Cursor) -> Result<T, DecodeError> {
        if !cursor.advance()? {
            return Err(DecodeError::exhausted(format!(
                "`{}` container header",
                self.type_name
            )));
        }
        self.decode_current(cursor)
    }

    /// 以游标当前令牌为容器头解码，供嵌套场景交接使用。
    pub fn decode_current(&self, cursor: &mut dyn Cursor) -> Result<T, DecodeError> {
        let kind = cursor
            .container_kind()
            .ok_or_else(|| unexpected("positional or keyed container", cursor.current()))?;
        let reported = cursor.reported_len();

        if kind == ContainerKind::Positional
            && let Some(actual) = reported
            && actual != self.members.len()
        {
            return Err(DecodeError::ItemCountMismatch {
                expected: self.members.len(),
                actual,
            });
        }

        let mut target = (self.constructor)();
        match kind {
            ContainerKind::Positional => self.decode_positional(cursor, &mut target, reported)?,
            ContainerKind::Keyed => self.decode_keyed(cursor, &mut target, reported)?,
        }
        Ok(target)
    }

    fn decode_positional(
        &self,
        cursor: &mut dyn Cursor,
        target: &mut T,
        reported: Option<usize>,
    ) -> Result<(), DecodeError> {
        let open = reported.is_none();
        for (position, member) in self.members.iter().enumerate() {
            if !cursor.advance()? || (open && matches!(cursor.current(), Some(Token::End))) {
                return Err(DecodeError::exhausted(format!("member `{}`", member.name())));
            }
            self.apply(position, cursor, target)?;
        }

        if open {
            // 条目数未知：多余的值一律跳过，直到容器结束。
            loop {
                if !cursor.advance()? {
                    return Err(DecodeError::exhausted("end of positional container"));
                }
                if matches!(cursor.current(), Some(Token::End)) {
                    break;
                }
                trace!(target_type = %self.type_name, "skipping trailing positional value");
                cursor.skip_value()?;
            }
        }
        Ok(())
    }

    fn decode_keyed(
        &self,
        cursor: &mut dyn Cursor,
        target: &mut T,
        reported: Option<usize>,
    ) -> Result<(), DecodeError> {
        let mut remaining = reported;
        loop {
            match remaining.as_mut() {
                Some(0) => break,
                Some(left) => *left -= 1,
                None => {}
            }
            if !cursor.advance()? {
                return Err(DecodeError::exhausted("map key"));
            }
            if remaining.is_none() && matches!(cursor.current(), Some(Token::End)) {
                break;
            }

            let key = cursor.current_str()?;
            let Some(position) = self.index.position(key) else {
                if self.options.unknown_keys == UnknownKeyPolicy::Reject {
                    return Err(DecodeError::UnknownKey {
                        key: key.to_string(),
                    });
                }
                trace!(target_type = %self.type_name, key, "skipping unknown key");
                if !cursor.advance()? {
                    return Err(DecodeError::exhausted("value of unknown key"));
                }
                cursor.skip_value()?;
                continue;
            };

            if !cursor.advance()? {
                return Err(DecodeError::exhausted(format!(
                    "member `{}`",
                    self.members[position].name()
                )));
            }
            self.apply(position, cursor, target)?;
        }
        Ok(())
    }

    /// 把当前令牌开头的值写入第 `position` 个成员，空值按成员策略处理。
    fn apply(
        &self,
        position: usize,
        cursor: &mut dyn Cursor,
        target: &mut T,
    ) -> Result<(), DecodeError> {
        let member = &self.members[position];
        let accessor = &self.accessors[position];

        if cursor.is_absent() {
            return match member.policy() {
                AbsentValuePolicy::SetToNull => accessor
                    .clear(target)
                    .map_err(|err| access_failure(member, err)),
                AbsentValuePolicy::KeepDefault => Ok(()),
                AbsentValuePolicy::Prohibit => Err(DecodeError::NullNotPermitted {
                    member: member.name().to_string(),
                }),
            };
        }

        let value = self.codecs[position].decode_value(cursor)?;
        accessor
            .write(target, value)
            .map_err(|err| access_failure(member, err))
    }

    /// 通过读访问器查看实例上某成员的当前值。
    pub fn read_member<'a>(
        &self,
        target: &'a T,
        name: &str,
    ) -> Option<&'a (dyn Any + Send + Sync)> {
        let position = self.index.position(name)?;
        self.accessors[position].read(target)
    }

    /// 诊断输出使用的类型名。
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// 按声明顺序排列的成员描述。
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// 与成员下标对齐的子编解码器。
    pub fn codecs(&self) -> &[Arc<dyn ValueCodec>] {
        &self.codecs
    }

    /// 按名字查找成员的子编解码器。
    pub fn member_codec(&self, name: &str) -> Option<&Arc<dyn ValueCodec>> {
        self.index
            .position(name)
            .and_then(|position| self.codecs.get(position))
    }

    /// 成员数。
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// 是否没有成员。
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 冻结的运行选项。
    pub fn options(&self) -> DecoderOptions {
        self.options
    }
}

fn access_failure(member: &MemberDescriptor, err: AccessError) -> DecodeError {
    match err {
        AccessError::TypeMismatch { expected } => DecodeError::TypeMismatch {
            member: member.name().to_string(),
            expected,
        },
        AccessError::NotNullable => DecodeError::NullNotPermitted {
            member: member.name().to_string(),
        },
    }
}

impl<T> ValueCodec for CompositeDecoder<T>
where
    T: Send + Sync + 'static,
{
    fn value_type(&self) -> ValueType {
        ValueType::of::<T>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        Ok(Box::new(self.decode_current(cursor)?))
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.type_name)
    }

    fn as_structural(&self) -> Option<&dyn StructuralDescribe> {
        Some(self)
    }
}

impl<T> fmt::Debug for CompositeDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDecoder")
            .field("type_name", &self.type_name)
            .field("members", &self.members)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// [`CompositeDecoder`] 的构建器。
///
/// 成员既可以通过 [`field`](Self::field)/[`nullable_field`](Self::nullable_field) 连同访问器一起声明，
/// 也可以先给出 [`catalog`](Self::catalog) 再用 [`members`](Self::members) 只列描述、按名字绑定。
pub struct CompositeDecoderBuilder<T> {
    type_name: Option<Cow<'static, str>>,
    members: Vec<MemberDescriptor>,
    catalog: AccessorCatalog<T>,
    constructor: Option<Constructor<T>>,
    options: DecoderOptions,
}

impl<T: 'static> CompositeDecoderBuilder<T> {
    /// 创建空构建器。
    pub fn new() -> Self {
        Self {
            type_name: None,
            members: Vec::new(),
            catalog: AccessorCatalog::new(),
            constructor: None,
            options: DecoderOptions::default(),
        }
    }

    /// 覆盖诊断输出中的类型名。
    pub fn type_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// 声明普通字段成员。
    pub fn field<V>(
        mut self,
        member: MemberDescriptor,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self
    where
        V: Any + Send + Sync,
    {
        self.catalog = self.catalog.field(member.name().to_string(), get, get_mut);
        self.members.push(member);
        self
    }

    /// 声明可空字段成员。
    pub fn nullable_field<V>(
        mut self,
        member: MemberDescriptor,
        get: fn(&T) -> &Option<V>,
        get_mut: fn(&mut T) -> &mut Option<V>,
    ) -> Self
    where
        V: Any + Send + Sync,
    {
        self.catalog = self
            .catalog
            .nullable_field(member.name().to_string(), get, get_mut);
        self.members.push(member);
        self
    }

    /// 以自定义访问器声明成员。
    pub fn member(mut self, member: MemberDescriptor, accessor: Accessor<T>) -> Self {
        self.catalog.insert(member.name().to_string(), accessor);
        self.members.push(member);
        self
    }

    /// 追加只含描述的成员，访问器从目录按名字绑定。
    pub fn members(mut self, members: impl IntoIterator<Item = MemberDescriptor>) -> Self {
        self.members.extend(members);
        self
    }

    /// 替换访问器目录。
    pub fn catalog(mut self, catalog: AccessorCatalog<T>) -> Self {
        self.catalog = catalog;
        self
    }

    /// 指定零参数构造器。
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// 使用 `T::default` 作为构造器。
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// 指定运行选项。
    pub fn options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    /// 指定未知键策略。
    pub fn unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.options.unknown_keys = policy;
        self
    }

    /// 完成配置：校验构造器、建立名字索引、编译访问器、解析子编解码器。
    pub fn build(self, registry: &dyn CodecRegistry) -> Result<CompositeDecoder<T>, ConfigError> {
        CompositeDecoder::assemble(
            self.type_name,
            self.members,
            &self.catalog,
            self.constructor,
            self.options,
            registry,
        )
    }
}

impl<T: 'static> Default for CompositeDecoderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::TokenCursor;
    use crate::registry::InMemoryCodecRegistry;
    use tracing_test::traced_test;

    #[derive(Debug, Default, PartialEq)]
    struct Probe {
        id: u32,
        note: Option<String>,
    }

    fn decoder(policy: UnknownKeyPolicy) -> CompositeDecoder<Probe> {
        CompositeDecoder::<Probe>::builder()
            .field(MemberDescriptor::new("id"), |p| &p.id, |p| &mut p.id)
            .nullable_field(
                MemberDescriptor::new("note").with_policy(AbsentValuePolicy::SetToNull),
                |p| &p.note,
                |p| &mut p.note,
            )
            .default_constructor()
            .unknown_keys(policy)
            .build(&InMemoryCodecRegistry::with_primitives())
            .expect("valid configuration")
    }

    #[traced_test]
    #[test]
    fn unknown_key_skip_is_traced() {
        let decoder = decoder(UnknownKeyPolicy::Skip);
        let mut cursor = TokenCursor::new(vec![
            Token::Map(Some(2)),
            Token::str("extra"),
            Token::Seq(Some(1)),
            Token::Int(9),
            Token::str("id"),
            Token::UInt(4),
        ]);
        let probe = decoder.decode(&mut cursor).expect("lenient");
        assert_eq!(probe.id, 4);
        assert!(logs_contain("skipping unknown key"));
    }

    #[test]
    fn unknown_key_reject_names_key() {
        let decoder = decoder(UnknownKeyPolicy::Reject);
        let mut cursor = TokenCursor::new(vec![
            Token::Map(Some(1)),
            Token::str("extra"),
            Token::Int(9),
        ]);
        let err = decoder.decode(&mut cursor).expect_err("strict");
        assert_eq!(err, DecodeError::UnknownKey { key: "extra".into() });
    }

    #[test]
    fn scalar_top_level_is_not_a_container() {
        let decoder = decoder(UnknownKeyPolicy::Skip);
        let mut cursor = TokenCursor::new(vec![Token::Int(1)]);
        let err = decoder.decode(&mut cursor).expect_err("scalar");
        assert_eq!(
            err,
            DecodeError::UnexpectedToken {
                expected: "positional or keyed container",
                found: "integer",
            }
        );
    }

    #[test]
    fn empty_stream_is_exhausted_before_header() {
        let decoder = decoder(UnknownKeyPolicy::Skip);
        let mut cursor = TokenCursor::new(Vec::new());
        let err = decoder.decode(&mut cursor).expect_err("nothing to read");
        assert!(matches!(err, DecodeError::StreamExhausted { .. }));
    }

    #[test]
    fn read_member_goes_through_read_accessor() {
        let decoder = decoder(UnknownKeyPolicy::Skip);
        let probe = Probe {
            id: 11,
            note: Some("n".into()),
        };
        let id = decoder
            .read_member(&probe, "id")
            .and_then(|value| value.downcast_ref::<u32>());
        assert_eq!(id, Some(&11));
        assert!(decoder.read_member(&probe, "ghost").is_none());
    }

    #[test]
    fn missing_constructor_is_a_configuration_error() {
        let err = CompositeDecoder::<Probe>::builder()
            .field(MemberDescriptor::new("id"), |p| &p.id, |p| &mut p.id)
            .build(&InMemoryCodecRegistry::with_primitives())
            .expect_err("no constructor");
        assert!(matches!(err, ConfigError::MissingConstructor { .. }));
    }
}
