//! # 游标契约
//!
//! ## 角色定位（Why）
//! - 复合解码器不直接解析字节，而是消费一条“拉取式”的令牌流：前进一步、查看当前令牌、
//!   判断是否为容器头、读取条目数、判断是否为空值标记；
//! - 把线格式细节关在游标实现里，同一个解码器即可服务 MessagePack 字节、内存令牌表等多种来源。
//!
//! ## 定位约定（What）
//! - [`Cursor::current`] 是最近一次 [`Cursor::advance`] 读到的令牌；
//! - 值消费者（子编解码器）进入时，值的首个令牌已是当前令牌；返回时，值的最后一个令牌是当前令牌；
//! - 条目数未知的容器以 [`Token::End`] 收尾；
//! - 游标不是线程安全的，并发解码必须各自持有游标。
//!
//! ## 实现清单（How）
//! - [`TokenCursor`]：内存令牌表，测试与工具链使用；
//! - [`MsgPackCursor`]：基于 `rmp` 的 MessagePack 字节游标（`msgpack` feature）。

use crate::error::DecodeError;

#[cfg(feature = "msgpack")]
mod msgpack;
mod tokens;

#[cfg(feature = "msgpack")]
pub use msgpack::MsgPackCursor;
pub use tokens::TokenCursor;

/// 令牌流中的单个令牌。
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// 空值标记。
    Nil,
    /// 布尔值。
    Bool(bool),
    /// 有符号整数。
    Int(i64),
    /// 无符号整数。
    UInt(u64),
    /// 浮点数。
    Float(f64),
    /// UTF-8 字符串。
    Str(String),
    /// 原始字节。
    Bin(Vec<u8>),
    /// 位置序列头，携带条目数（未知时为 `None`）。
    Seq(Option<usize>),
    /// 键值映射头，携带键值对数（未知时为 `None`）。
    Map(Option<usize>),
    /// 条目数未知的容器的结束标记。
    End,
}

impl Token {
    /// 便捷构造字符串令牌。
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// 令牌种类名，用于错误信息。
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bin(_) => "binary",
            Self::Seq(_) => "positional container",
            Self::Map(_) => "keyed container",
            Self::End => "container end",
        }
    }
}

/// 容器形态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// 按声明顺序排列的值序列。
    Positional,
    /// 名字/值对，顺序任意，可缺可多。
    Keyed,
}

/// `Cursor` 是复合解码器消费的拉取式令牌源。
///
/// # 教案式说明
/// - **意图 (Why)**：以最少的必需方法（`advance` + `current`）描述任意线格式，其余查询都有基于
///   当前令牌的默认实现，游标作者只在有更高效手段时才覆盖；
/// - **契约 (What)**：
///   - `advance` 返回 `Ok(false)` 表示流已耗尽，返回错误表示底层数据损坏或被取消；
///   - `skip_value` 消费以当前令牌开头的一个完整值（含嵌套容器），返回时该值最后一个令牌为当前令牌；
/// - **风险 (Trade-offs)**：令牌中的字符串与字节是拥有型的，换来对象安全与实现简单，代价是一次拷贝。
pub trait Cursor {
    /// 前进到下一个令牌。
    fn advance(&mut self) -> Result<bool, DecodeError>;

    /// 当前令牌；尚未前进时为 `None`。
    fn current(&self) -> Option<&Token>;

    /// 当前令牌若为容器头，返回其形态。
    fn container_kind(&self) -> Option<ContainerKind> {
        match self.current() {
            Some(Token::Seq(_)) => Some(ContainerKind::Positional),
            Some(Token::Map(_)) => Some(ContainerKind::Keyed),
            _ => None,
        }
    }

    /// 当前容器头报告的条目数；非容器头或未知时为 `None`。
    fn reported_len(&self) -> Option<usize> {
        match self.current() {
            Some(Token::Seq(len)) | Some(Token::Map(len)) => *len,
            _ => None,
        }
    }

    /// 当前令牌是否为空值标记。
    fn is_absent(&self) -> bool {
        matches!(self.current(), Some(Token::Nil))
    }

    /// 以字符串读取当前令牌，用于映射的键。
    fn current_str(&self) -> Result<&str, DecodeError> {
        match self.current() {
            Some(Token::Str(value)) => Ok(value.as_str()),
            other => Err(unexpected("string key", other)),
        }
    }

    /// 跳过以当前令牌开头的一个完整值。
    fn skip_value(&mut self) -> Result<(), DecodeError> {
        let mut open: Vec<Pending> = Vec::new();
        if let Some(frame) = Pending::for_token(self.current()) {
            open.push(frame);
        }

        while let Some(top) = open.last() {
            if matches!(top, Pending::Counted(0)) {
                open.pop();
                continue;
            }
            if !self.advance()? {
                return Err(DecodeError::exhausted("skipped value"));
            }
            let is_end = matches!(self.current(), Some(Token::End));
            match open.last_mut() {
                Some(Pending::Counted(remaining)) => {
                    if is_end {
                        return Err(unexpected("container item", self.current()));
                    }
                    *remaining -= 1;
                }
                Some(Pending::Open) if is_end => {
                    open.pop();
                    continue;
                }
                _ => {}
            }
            if let Some(frame) = Pending::for_token(self.current()) {
                open.push(frame);
            }
        }
        Ok(())
    }
}

/// `skip_value` 的待消费栈帧。
#[derive(Clone, Copy, Debug)]
enum Pending {
    /// 还剩若干令牌级条目。
    Counted(usize),
    /// 条目数未知，等待 `End`。
    Open,
}

impl Pending {
    fn for_token(token: Option<&Token>) -> Option<Self> {
        match token {
            Some(Token::Seq(Some(len))) => Some(Self::Counted(*len)),
            Some(Token::Map(Some(len))) => Some(Self::Counted(len.saturating_mul(2))),
            Some(Token::Seq(None)) | Some(Token::Map(None)) => Some(Self::Open),
            _ => None,
        }
    }
}

/// 构造“令牌不符合期望”的错误。
pub fn unexpected(expected: &'static str, found: Option<&Token>) -> DecodeError {
    DecodeError::UnexpectedToken {
        expected,
        found: found.map_or("end of stream", Token::kind),
    }
}
