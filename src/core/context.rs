use crate::domain::model::ResourceKey;
use crate::utils::error::{AdapterError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// context 中一個已發布的值，連同它的型別名稱
pub struct Slot {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Slot {
    fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// 單一請求的 context：固定名稱 → handle
///
/// 每個請求各自擁有一份，不跨請求共享。Adapter 在呼叫下游前發布自己的兩個名稱，
/// 下游結束後收回；下游 handler 只拿到 `&RequestContext`。
pub struct RequestContext {
    request_id: Uuid,
    slots: HashMap<&'static str, Slot>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4())
    }

    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            slots: HashMap::new(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// 發布一個值；若名稱已被佔用，回傳被遮蔽的舊值供之後還原
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        key: ResourceKey<T>,
        value: T,
    ) -> Option<Slot> {
        self.slots.insert(key.name(), Slot::new(value))
    }

    /// 收回自己發布的值，並把先前被遮蔽的值放回去
    pub fn withdraw<T: Send + Sync + 'static>(
        &mut self,
        key: ResourceKey<T>,
        previous: Option<Slot>,
    ) -> Option<T> {
        let current = self.slots.remove(key.name());
        if let Some(previous) = previous {
            self.slots.insert(key.name(), previous);
        }
        current
            .and_then(|slot| slot.value.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn get<T: 'static>(&self, key: ResourceKey<T>) -> Option<&T> {
        self.get_by_name(key.name())
    }

    /// 取不到時回傳 `MissingResource`，而不是在第一次使用時才出錯
    pub fn require<T: 'static>(&self, key: ResourceKey<T>) -> Result<&T> {
        self.lookup(key.name())
    }

    pub fn get_by_name<T: 'static>(&self, name: &str) -> Option<&T> {
        self.slots
            .get(name)
            .and_then(|slot| (*slot.value).downcast_ref::<T>())
    }

    /// 依字串名稱取值，區分「沒掛上」與「型別不符」
    pub fn lookup<T: 'static>(&self, name: &str) -> Result<&T> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| AdapterError::MissingResource {
                name: name.to_string(),
            })?;

        (*slot.value)
            .downcast_ref::<T>()
            .ok_or_else(|| AdapterError::ResourceTypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn type_name_of(&self, name: &str) -> Option<&'static str> {
        self.slots.get(name).map(Slot::type_name)
    }

    /// 目前已發布的名稱（排序後）
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.slots.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: ResourceKey<String> = ResourceKey::new("Greeting");
    const COUNTER: ResourceKey<u32> = ResourceKey::new("Counter");

    #[test]
    fn test_new_context_is_empty() {
        let ctx = RequestContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.get(GREETING).is_none());
    }

    #[test]
    fn test_insert_and_get() {
        let mut ctx = RequestContext::new();
        assert!(ctx.insert(GREETING, "hello".to_string()).is_none());

        assert_eq!(ctx.get(GREETING).unwrap(), "hello");
        assert_eq!(ctx.get_by_name::<String>("Greeting").unwrap(), "hello");
        assert!(ctx.contains("Greeting"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_missing_resource_is_distinguishable() {
        let ctx = RequestContext::new();
        let err = ctx.require(GREETING).unwrap_err();
        assert!(err.is_missing_resource());
        assert!(err.to_string().contains("Greeting"));
    }

    #[test]
    fn test_lookup_type_mismatch() {
        let mut ctx = RequestContext::new();
        ctx.insert(COUNTER, 7);

        assert!(ctx.get_by_name::<String>("Counter").is_none());
        match ctx.lookup::<String>("Counter") {
            Err(AdapterError::ResourceTypeMismatch { name, .. }) => assert_eq!(name, "Counter"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(*ctx.lookup::<u32>("Counter").unwrap(), 7);
    }

    #[test]
    fn test_withdraw_restores_shadowed_value() {
        let mut ctx = RequestContext::new();
        ctx.insert(GREETING, "outer".to_string());

        let shadowed = ctx.insert(GREETING, "inner".to_string());
        assert_eq!(ctx.get(GREETING).unwrap(), "inner");

        let released = ctx.withdraw(GREETING, shadowed);
        assert_eq!(released.as_deref(), Some("inner"));
        assert_eq!(ctx.get(GREETING).unwrap(), "outer");

        let released = ctx.withdraw(GREETING, None);
        assert_eq!(released.as_deref(), Some("outer"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut ctx = RequestContext::new();
        ctx.insert(GREETING, "hi".to_string());
        ctx.insert(COUNTER, 1);
        assert_eq!(ctx.names(), vec!["Counter", "Greeting"]);
        assert_eq!(ctx.type_name_of("Counter"), Some("u32"));
    }

    #[test]
    fn test_contexts_have_distinct_request_ids() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.request_id(), b.request_id());
    }
}
