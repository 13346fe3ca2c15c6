use std::collections::HashMap;

use crate::error::ConfigError;

/// 成员名到成员下标的映射，仅供键值映射解码解析键名。
///
/// 构建一次、只读共享；重复名字在构建期即以 [`ConfigError::DuplicateMember`] 拒绝，保证任何键
/// 至多解析到一个成员。
#[derive(Clone, Debug, Default)]
pub struct NameIndex {
    positions: HashMap<Box<str>, usize>,
}

impl NameIndex {
    /// 按给定顺序建立索引，下标即迭代序号。
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, ConfigError> {
        let names = names.into_iter();
        let mut positions = HashMap::with_capacity(names.size_hint().0);
        for (position, name) in names.enumerate() {
            if positions.insert(Box::from(name), position).is_some() {
                return Err(ConfigError::DuplicateMember {
                    name: name.to_string(),
                });
            }
        }
        Ok(Self { positions })
    }

    /// 解析名字。
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// 条目数。
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
