//! 句柄与分代槽位
//!
//! 注销后槽位的代数递增，旧句柄随即失效；槽位可被后续注册复用。

use std::marker::PhantomData;

/// 分代句柄
#[derive(Debug)]
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// derive 会给 T 加上不需要的约束，这里手动实现
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

/// 骨骼链句柄标记
#[derive(Debug)]
pub enum ChainTag {}

/// 碰撞体集合句柄标记
#[derive(Debug)]
pub enum ColliderSetTag {}

/// 骨骼链句柄
pub type ChainHandle = Handle<ChainTag>;
/// 碰撞体集合句柄
pub type ColliderSetHandle = Handle<ColliderSetTag>;

#[derive(Debug)]
struct Slot<V> {
    generation: u32,
    value: Option<V>,
}

/// 分代槽位表
#[derive(Debug)]
pub(crate) struct Slots<Tag, V> {
    slots: Vec<Slot<V>>,
    free: Vec<usize>,
    _marker: PhantomData<fn() -> Tag>,
}

impl<Tag, V> Slots<Tag, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn insert(&mut self, value: V) -> Handle<Tag> {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                Handle::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot { generation: 0, value: Some(value) });
                Handle::new(self.slots.len() - 1, 0)
            }
        }
    }

    pub fn remove(&mut self, handle: Handle<Tag>) -> Option<V> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation || slot.value.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        slot.value.take()
    }

    pub fn get(&self, handle: Handle<Tag>) -> Option<&V> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<Tag>) -> Option<&mut V> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    #[inline]
    pub fn contains(&self, handle: Handle<Tag>) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<Tag>, &V)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (Handle::new(i, s.generation), v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.slots.iter_mut().filter_map(|s| s.value.as_mut())
    }
}

impl<Tag, V> Default for Slots<Tag, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_rejected() {
        let mut slots: Slots<ChainTag, &str> = Slots::new();
        let a = slots.insert("a");
        assert_eq!(slots.get(a), Some(&"a"));

        assert_eq!(slots.remove(a), Some("a"));
        assert_eq!(slots.remove(a), None);

        // 复用槽位，旧句柄失效
        let b = slots.insert("b");
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert_ne!(a, b);
        assert_eq!(slots.get(a), None);
        assert_eq!(slots.get(b), Some(&"b"));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut slots: Slots<ColliderSetTag, u32> = Slots::new();
        let a = slots.insert(1);
        let _b = slots.insert(2);
        slots.remove(a);
        let values: Vec<u32> = slots.values().copied().collect();
        assert_eq!(values, vec![2]);
        assert_eq!(slots.iter().count(), 1);
    }
}
