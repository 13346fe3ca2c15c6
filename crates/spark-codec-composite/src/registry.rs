//! # 子编解码器注册中心
//!
//! ## 核心意图（Why）
//! - 复合解码器在配置期为每个成员向注册中心索取其值类型的编解码器，并在自身生命周期内缓存；
//! - 注册中心是外部协作者：本 crate 只约定 [`CodecRegistry::resolve`] 一个入口，同时提供基于
//!   `DashMap` 的 [`InMemoryCodecRegistry`] 作为默认实现。
//!
//! ## 行为契约（What）
//! - `resolve` 对未登记的类型返回 [`RegistryError::UnsupportedType`]，由解码器包装为配置期错误；
//! - 两个成员共享同一值类型时是否拿到同一实例，取决于注册中心自身的缓存策略，解码器不作假设；
//! - 注册可在多线程并发进行，重复注册同一类型被拒绝，不会悄悄覆盖。
//!
//! ## 风险提示（Trade-offs）
//! - `DashMap` 的分片锁只在注册与解析时短暂持有，解码热路径不访问注册中心。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::debug;

use crate::accessor::Accessor;
use crate::codec::{ListCodec, ValueCodec, primitives};
use crate::descriptor::MemberDescriptor;
use crate::error::{ConfigError, RegistryError};
use crate::value::ValueType;

/// 按值类型解析子编解码器的注册中心契约。
pub trait CodecRegistry: Send + Sync {
    /// 返回负责 `value_type` 的编解码器。
    fn resolve(&self, value_type: &ValueType) -> Result<Arc<dyn ValueCodec>, RegistryError>;
}

/// 基于 `DashMap` 的内存注册中心。
///
/// # 教案式注释
/// - **意图 (Why)**：提供开箱即用、并发安全的注册中心，同一类型始终解析到同一个共享实例；
/// - **契约 (What)**：以 [`ValueType`] 为键，注册时若已存在返回
///   [`RegistryError::DuplicateRegistration`]；
/// - **风险 (Trade-offs)**：未提供注销接口，已构建的解码器持有 `Arc`，注销也无法回收其引用。
#[derive(Default)]
pub struct InMemoryCodecRegistry {
    codecs: DashMap<ValueType, Arc<dyn ValueCodec>>,
}

impl InMemoryCodecRegistry {
    /// 创建空注册中心。
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建并预装全部内置叶子编解码器。
    pub fn with_primitives() -> Self {
        let codecs = primitives::builtin()
            .into_iter()
            .map(|codec| (codec.value_type(), codec))
            .collect();
        Self { codecs }
    }

    /// 注册编解码器。
    pub fn register<C: ValueCodec>(&self, codec: C) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(codec))
    }

    /// 注册已共享的编解码器，例如嵌套使用的复合解码器。
    pub fn register_shared(&self, codec: Arc<dyn ValueCodec>) -> Result<(), RegistryError> {
        let value_type = codec.value_type();
        match self.codecs.entry(value_type) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateRegistration {
                type_name: value_type.name(),
            }),
            Entry::Vacant(vacant) => {
                debug!(value_type = value_type.name(), codec = %codec.label(), "codec registered");
                vacant.insert(codec);
                Ok(())
            }
        }
    }

    /// 为已注册的元素类型 `V` 注册 `Vec<V>` 列表编解码器。
    pub fn register_list<V>(&self) -> Result<(), RegistryError>
    where
        V: Any + Send + Sync,
    {
        let element = self.resolve(&ValueType::of::<V>())?;
        self.register(ListCodec::<V>::new(element))
    }

    /// 已注册的类型数量。
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl CodecRegistry for InMemoryCodecRegistry {
    fn resolve(&self, value_type: &ValueType) -> Result<Arc<dyn ValueCodec>, RegistryError> {
        self.codecs
            .get(value_type)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RegistryError::UnsupportedType {
                type_name: value_type.name(),
            })
    }
}

impl fmt::Debug for InMemoryCodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCodecRegistry")
            .field("len", &self.codecs.len())
            .finish()
    }
}

/// 子编解码器解析：为每个成员取得一个编解码器，结果与成员下标对齐。
///
/// 成员描述的集合标记必须与编解码器的 [`ValueCodec::is_collection`] 一致。
pub fn resolve_member_codecs<T>(
    members: &[MemberDescriptor],
    accessors: &[Accessor<T>],
    registry: &dyn CodecRegistry,
) -> Result<Vec<Arc<dyn ValueCodec>>, ConfigError> {
    members
        .iter()
        .zip(accessors)
        .map(|(member, accessor)| {
            let codec = registry
                .resolve(&accessor.value_type())
                .map_err(|source| ConfigError::Registry {
                    member: member.name().into(),
                    source,
                })?;
            if codec.is_collection() != member.is_collection_valued() {
                return Err(ConfigError::CollectionMismatch {
                    name: member.name().into(),
                    declared: if member.is_collection_valued() {
                        "collection-valued"
                    } else {
                        "scalar-valued"
                    },
                    codec: codec.label().into_owned(),
                });
            }
            Ok(codec)
        })
        .collect()
}
