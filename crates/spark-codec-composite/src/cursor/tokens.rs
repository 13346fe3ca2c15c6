use super::{Cursor, Token};
use crate::error::DecodeError;

/// 基于内存令牌表的游标。
///
/// 适用于单元测试、夹具与“已经解析成令牌”的上游；不做任何格式校验，令牌按给定顺序逐个吐出。
#[derive(Clone, Debug, Default)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    position: Option<usize>,
}

impl TokenCursor {
    /// 由令牌序列创建，初始处于“尚未前进”状态。
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            position: None,
        }
    }

    /// 尚未消费的令牌数。
    pub fn remaining(&self) -> usize {
        match self.position {
            Some(position) => self.tokens.len().saturating_sub(position + 1),
            None => self.tokens.len(),
        }
    }
}

impl Cursor for TokenCursor {
    fn advance(&mut self) -> Result<bool, DecodeError> {
        let next = self.position.map_or(0, |position| position + 1);
        if next < self.tokens.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn current(&self) -> Option<&Token> {
        self.position.and_then(|position| self.tokens.get(position))
    }
}
