//! 叶子编解码器：布尔、整数、浮点、字符串、字节。
//!
//! 均为无状态零尺寸类型，可在任意线程共享。[`install`] 把全部内置实现注册进
//! [`InMemoryCodecRegistry`]。

use std::any::Any;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use super::ValueCodec;
use crate::cursor::{Cursor, Token, unexpected};
use crate::error::{DecodeError, RegistryError};
use crate::registry::InMemoryCodecRegistry;
use crate::value::{DynValue, ValueType};

/// `bool` 编解码器。
#[derive(Clone, Copy, Debug, Default)]
pub struct BoolCodec;

impl ValueCodec for BoolCodec {
    fn value_type(&self) -> ValueType {
        ValueType::of::<bool>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        match cursor.current() {
            Some(Token::Bool(value)) => Ok(Box::new(*value)),
            other => Err(unexpected("bool", other)),
        }
    }
}

/// 整数编解码器，接受有符号与无符号令牌，超出 `N` 的范围即 [`DecodeError::NumericOverflow`]。
pub struct IntCodec<N> {
    _marker: PhantomData<fn() -> N>,
}

impl<N> IntCodec<N> {
    /// 创建编解码器。
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<N> Default for IntCodec<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> ValueCodec for IntCodec<N>
where
    N: TryFrom<i64> + TryFrom<u64> + Any + Send + Sync,
{
    fn value_type(&self) -> ValueType {
        ValueType::of::<N>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        let converted = match cursor.current() {
            Some(Token::Int(value)) => N::try_from(*value).ok(),
            Some(Token::UInt(value)) => N::try_from(*value).ok(),
            other => return Err(unexpected("integer", other)),
        };
        match converted {
            Some(value) => Ok(Box::new(value)),
            None => Err(DecodeError::NumericOverflow {
                target: std::any::type_name::<N>(),
            }),
        }
    }
}

/// `f64` 编解码器；整数令牌按 `as` 语义转换。
#[derive(Clone, Copy, Debug, Default)]
pub struct F64Codec;

impl ValueCodec for F64Codec {
    fn value_type(&self) -> ValueType {
        ValueType::of::<f64>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        Ok(Box::new(read_float(cursor)?))
    }
}

/// `f32` 编解码器；双精度值收窄为单精度。
#[derive(Clone, Copy, Debug, Default)]
pub struct F32Codec;

impl ValueCodec for F32Codec {
    fn value_type(&self) -> ValueType {
        ValueType::of::<f32>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        Ok(Box::new(read_float(cursor)? as f32))
    }
}

fn read_float(cursor: &dyn Cursor) -> Result<f64, DecodeError> {
    match cursor.current() {
        Some(Token::Float(value)) => Ok(*value),
        Some(Token::Int(value)) => Ok(*value as f64),
        Some(Token::UInt(value)) => Ok(*value as f64),
        other => Err(unexpected("float", other)),
    }
}

/// `String` 编解码器。
#[derive(Clone, Copy, Debug, Default)]
pub struct StringCodec;

impl ValueCodec for StringCodec {
    fn value_type(&self) -> ValueType {
        ValueType::of::<String>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        match cursor.current() {
            Some(Token::Str(value)) => Ok(Box::new(value.clone())),
            other => Err(unexpected("string", other)),
        }
    }
}

/// `Vec<u8>` 编解码器，只接受二进制令牌。
#[derive(Clone, Copy, Debug, Default)]
pub struct BytesCodec;

impl ValueCodec for BytesCodec {
    fn value_type(&self) -> ValueType {
        ValueType::of::<Vec<u8>>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        match cursor.current() {
            Some(Token::Bin(value)) => Ok(Box::new(value.clone())),
            other => Err(unexpected("binary", other)),
        }
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed("bytes")
    }
}

/// 全部内置叶子编解码器，值类型两两不同。
pub fn builtin() -> Vec<Arc<dyn ValueCodec>> {
    let codecs: [Arc<dyn ValueCodec>; 13] = [
        Arc::new(BoolCodec),
        Arc::new(IntCodec::<i8>::new()),
        Arc::new(IntCodec::<i16>::new()),
        Arc::new(IntCodec::<i32>::new()),
        Arc::new(IntCodec::<i64>::new()),
        Arc::new(IntCodec::<u8>::new()),
        Arc::new(IntCodec::<u16>::new()),
        Arc::new(IntCodec::<u32>::new()),
        Arc::new(IntCodec::<u64>::new()),
        Arc::new(F32Codec),
        Arc::new(F64Codec),
        Arc::new(StringCodec),
        Arc::new(BytesCodec),
    ];
    Vec::from(codecs)
}

/// 把全部内置叶子编解码器注册进已有的注册中心，遇到已登记的类型即返回错误。
pub fn install(registry: &InMemoryCodecRegistry) -> Result<(), RegistryError> {
    builtin()
        .into_iter()
        .try_for_each(|codec| registry.register_shared(codec))
}
