//! MessagePack 字节游标。
//!
//! 每次 `advance` 先窥视首字节得到 [`Marker`]，再交给 `rmp::decode` 对应的读取函数消费该令牌。
//! 数组与映射只读出头部，元素由后续 `advance` 逐个读取，因此嵌套深度不受栈限制。

use std::fmt::Display;
use std::io;

use rmp::Marker;
use rmp::decode::{self, NumValueReadError, ValueReadError};

use super::{Cursor, Token};
use crate::error::DecodeError;

/// 基于 `rmp` 的 MessagePack 游标，借用输入字节，不做额外缓冲。
///
/// # 契约说明（What）
/// - 正整数映射为 [`Token::UInt`]，负整数映射为 [`Token::Int`]；
/// - `float32` 提升为 [`Token::Float`]；
/// - 扩展类型（ext）与保留标记视为损坏输入；
/// - 字符串或字节长度超过剩余输入时报告 [`DecodeError::StreamExhausted`]。
#[derive(Clone, Debug)]
pub struct MsgPackCursor<'a> {
    input: &'a [u8],
    current: Option<Token>,
}

impl<'a> MsgPackCursor<'a> {
    /// 在字节切片上创建游标。
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            current: None,
        }
    }

    /// 尚未消费的字节数。
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    fn read_token(&mut self, marker: Marker) -> Result<Token, DecodeError> {
        let rd = &mut self.input;
        let token = match marker {
            Marker::Null => {
                decode::read_nil(rd).map_err(read_failure)?;
                Token::Nil
            }
            Marker::True | Marker::False => {
                Token::Bool(decode::read_bool(rd).map_err(read_failure)?)
            }
            Marker::FixPos(_) | Marker::U8 | Marker::U16 | Marker::U32 | Marker::U64 => {
                Token::UInt(decode::read_int::<u64, _>(rd).map_err(num_failure)?)
            }
            Marker::FixNeg(_) | Marker::I8 | Marker::I16 | Marker::I32 | Marker::I64 => {
                Token::Int(decode::read_int::<i64, _>(rd).map_err(num_failure)?)
            }
            Marker::F32 => {
                Token::Float(f64::from(decode::read_f32(rd).map_err(read_failure)?))
            }
            Marker::F64 => Token::Float(decode::read_f64(rd).map_err(read_failure)?),
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                let len = decode::read_str_len(rd).map_err(read_failure)?;
                let bytes = self.take(len, "string payload")?;
                let text = String::from_utf8(bytes)
                    .map_err(|err| DecodeError::malformed(format!("invalid UTF-8 string: {err}")))?;
                Token::Str(text)
            }
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
                let len = decode::read_bin_len(rd).map_err(read_failure)?;
                Token::Bin(self.take(len, "binary payload")?)
            }
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => {
                let len = decode::read_array_len(rd).map_err(read_failure)?;
                Token::Seq(Some(len as usize))
            }
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => {
                let len = decode::read_map_len(rd).map_err(read_failure)?;
                Token::Map(Some(len as usize))
            }
            other => {
                return Err(DecodeError::malformed(format!(
                    "unsupported MessagePack marker {other:?}"
                )));
            }
        };
        Ok(token)
    }

    fn take(&mut self, len: u32, context: &str) -> Result<Vec<u8>, DecodeError> {
        let len = len as usize;
        if self.input.len() < len {
            return Err(DecodeError::exhausted(context));
        }
        let (head, rest) = self.input.split_at(len);
        self.input = rest;
        Ok(head.to_vec())
    }
}

impl Cursor for MsgPackCursor<'_> {
    fn advance(&mut self) -> Result<bool, DecodeError> {
        let Some(&first) = self.input.first() else {
            return Ok(false);
        };
        let token = self.read_token(Marker::from_u8(first))?;
        self.current = Some(token);
        Ok(true)
    }

    fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }
}

/// 输入在令牌中途结束属于流耗尽，其余读取失败视为数据损坏。
fn read_failure(err: ValueReadError<io::Error>) -> DecodeError {
    match &err {
        ValueReadError::InvalidMarkerRead(source) | ValueReadError::InvalidDataRead(source) => {
            io_failure(source, &err)
        }
        _ => malformed(&err),
    }
}

fn num_failure(err: NumValueReadError<io::Error>) -> DecodeError {
    match &err {
        NumValueReadError::InvalidMarkerRead(source)
        | NumValueReadError::InvalidDataRead(source) => io_failure(source, &err),
        _ => malformed(&err),
    }
}

fn io_failure(source: &io::Error, err: &dyn Display) -> DecodeError {
    if source.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::exhausted("MessagePack token")
    } else {
        malformed(err)
    }
}

fn malformed(err: impl Display) -> DecodeError {
    DecodeError::malformed(format!("{err}"))
}
