use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
};

/// Per-request storage shared by every handler of a request, one value per type.
#[derive(Default)]
pub struct Depot {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Depot {
    pub fn new() -> Depot {
        Depot::default()
    }
    /// Stores `value`, replacing any previous value of the same type.
    pub fn inject<V: Any + Send + Sync>(&mut self, value: V) -> &mut Self {
        self.map.insert(TypeId::of::<V>(), Box::new(value));
        self
    }
    pub fn obtain<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref::<T>())
    }
    pub fn obtain_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|b| b.downcast_mut::<T>())
    }
    pub fn scrape<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast::<T>().ok())
            .map(|b| *b)
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Depot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Depot").field("len", &self.map.len()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_depot_inject() {
        let mut depot = Depot::new();
        assert!(depot.is_empty());
        depot.inject(42u32).inject("users".to_owned());
        assert_eq!(depot.len(), 2);
        assert_eq!(depot.obtain::<u32>(), Some(&42));
        assert!(depot.obtain::<u64>().is_none());

        *depot.obtain_mut::<u32>().unwrap() += 1;
        depot.inject(String::from("notes"));
        assert_eq!(depot.obtain::<String>().unwrap(), "notes");

        assert_eq!(depot.scrape::<u32>(), Some(43));
        assert!(depot.obtain::<u32>().is_none());
        assert_eq!(depot.len(), 1);
    }
}
