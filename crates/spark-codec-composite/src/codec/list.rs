use std::any::Any;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use super::ValueCodec;
use crate::cursor::{Cursor, Token, unexpected};
use crate::error::DecodeError;
use crate::value::{DynValue, ValueType};

/// 按头部条目数预分配的上限。
const PREALLOC_LIMIT: usize = 1024;

/// 同构列表编解码器：把位置序列解码为 `Vec<V>`，元素交给元素编解码器。
///
/// # 契约说明（What）
/// - 只接受位置序列；条目数未知时读到 [`Token::End`] 为止；
/// - 元素不得为空值标记，需要可空元素时应使用自定义编解码器；
/// - 元素编解码器产出的动态类型必须是 `V`，否则报告 [`DecodeError::TypeMismatch`]。
pub struct ListCodec<V> {
    element: Arc<dyn ValueCodec>,
    label: String,
    _marker: PhantomData<fn() -> V>,
}

impl<V> ListCodec<V>
where
    V: Any + Send + Sync,
{
    /// 以元素编解码器创建。
    pub fn new(element: Arc<dyn ValueCodec>) -> Self {
        let label = format!("List<{}>", element.label());
        Self {
            element,
            label,
            _marker: PhantomData,
        }
    }

    /// 元素编解码器。
    pub fn element(&self) -> &Arc<dyn ValueCodec> {
        &self.element
    }
}

impl<V> ValueCodec for ListCodec<V>
where
    V: Any + Send + Sync,
{
    fn value_type(&self) -> ValueType {
        ValueType::of::<Vec<V>>()
    }

    fn decode_value(&self, cursor: &mut dyn Cursor) -> Result<DynValue, DecodeError> {
        let reported = match cursor.current() {
            Some(Token::Seq(len)) => *len,
            other => return Err(unexpected("positional container", other)),
        };

        // 条目数来自线上头部，不可信，预分配设上限。
        let mut items = Vec::with_capacity(reported.map_or(0, |len| len.min(PREALLOC_LIMIT)));
        let mut index = 0usize;
        loop {
            if reported.is_some_and(|len| index >= len) {
                break;
            }
            if !cursor.advance()? {
                return Err(DecodeError::exhausted(format!("list element {index}")));
            }
            if reported.is_none() && matches!(cursor.current(), Some(Token::End)) {
                break;
            }
            if cursor.is_absent() {
                return Err(unexpected("list element", cursor.current()));
            }
            let value = self.element.decode_value(cursor)?;
            let value = value
                .downcast::<V>()
                .map_err(|_| DecodeError::TypeMismatch {
                    member: format!("[{index}]"),
                    expected: std::any::type_name::<V>(),
                })?;
            items.push(*value);
            index += 1;
        }
        Ok(Box::new(items))
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.label)
    }

    fn is_collection(&self) -> bool {
        true
    }
}
