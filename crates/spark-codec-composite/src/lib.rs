#![deny(unsafe_code)]
#![warn(missing_docs)]

//! `spark-codec-composite` 提供基于成员描述表的通用复合值解码器。
//!
//! # 教案背景（Why）
//! - 同一个结构体在线上可能以两种形态出现：按声明顺序排列的位置序列，或以成员名为键的键值映射；
//! - 为每个类型手写两套解析逻辑既重复又易错，本 crate 把“成员有哪些、怎么写入、用什么解码”
//!   抽象成下标对齐的三张表，由 [`CompositeDecoder`] 统一完成形态分派与逐成员填充。
//!
//! # 使用概览（How）
//! - 用 [`MemberDescriptor`] 声明成员名与空值策略（[`AbsentValuePolicy`]），
//!   用 [`AccessorCatalog`] 或构建器上的 `field`/`nullable_field` 绑定读写访问器；
//! - 通过 [`InMemoryCodecRegistry`] 提供各成员值类型的子编解码器，复合解码器本身也可注册，
//!   从而支持任意层级的嵌套；
//! - 解码输入来自实现 [`Cursor`] 的令牌游标：内存令牌表 [`TokenCursor`] 或 MessagePack 字节游标
//!   `MsgPackCursor`（`msgpack` feature）；
//! - 成员描述表也可以写成 TOML（`schema-toml` feature），见 [`CompositeSchema`]。
//!
//! # 合约说明（What）
//! - 配置期错误统一为 [`ConfigError`]，解码期错误统一为 [`DecodeError`]，二者都带稳定错误码
//!   （见 [`codes`]）；
//! - 构建完成的解码器不可变，可跨线程共享并发解码；
//! - [`StructuralDescribe`] 以缩进文本渲染嵌套的成员结构，便于排障。
//!
//! # 风险提示与后续（Trade-offs）
//! - 只负责解码，编码方向不在本 crate 范围内；
//! - 诊断输出不做环检测，自引用的编解码器图会无限递归。

mod accessor;
pub mod codec;
pub mod cursor;
mod decoder;
mod describe;
mod descriptor;
mod error;
mod index;
mod options;
mod registry;
mod value;

pub use crate::accessor::{
    AccessError, Accessor, AccessorCatalog, Constructor, FieldAccess, MemberAccess,
    NullableFieldAccess, compile_accessors, require_constructor,
};
pub use crate::codec::{ListCodec, StructuralDescribe, ValueCodec, primitives};
#[cfg(feature = "msgpack")]
pub use crate::cursor::MsgPackCursor;
pub use crate::cursor::{ContainerKind, Cursor, Token, TokenCursor};
pub use crate::decoder::{CompositeDecoder, CompositeDecoderBuilder};
pub use crate::describe::{INDENT, describe_codec, write_indent};
pub use crate::descriptor::{AbsentValuePolicy, CompositeSchema, MemberDescriptor};
pub use crate::error::{ConfigError, DecodeError, RegistryError, codes};
pub use crate::index::NameIndex;
pub use crate::options::{DecoderOptions, UnknownKeyPolicy};
pub use crate::registry::{CodecRegistry, InMemoryCodecRegistry, resolve_member_codecs};
pub use crate::value::{DynValue, ValueType};
