use glframe::prelude::*;
use glframe::utils::prelude::*;

#[test]
fn handle_set() {
    let mut set = HandlePool::new();
    assert_eq!(set.len(), 0);

    let e1 = set.create();
    assert!(e1.is_valid());
    assert!(set.is_alive(e1));
    assert_eq!(set.len(), 1);

    let e2 = e1;
    assert!(set.is_alive(e2));
    assert_eq!(set.len(), 1);

    assert!(set.free(e2));
    assert!(!set.is_alive(e2));
    assert!(!set.is_alive(e1));
    assert_eq!(set.len(), 0);
}

#[test]
fn index_reuse() {
    let mut set = HandlePool::new();

    let mut v = vec![];
    for _ in 0..10 {
        v.push(set.create());
    }

    assert_eq!(set.len(), 10);
    for e in v.iter() {
        set.free(*e);
    }

    for _ in 0..10 {
        let e = set.create();
        assert!((e.index() as usize) < v.len());
        assert!(v[e.index() as usize].version() != e.version());
    }
}

#[test]
fn index_compact_reuse() {
    let mut set = HandlePool::new();

    let mut v = vec![];
    for _ in 0..5 {
        for _ in 0..50 {
            v.push(set.create());
        }

        let size = v.len() / 2;
        for _ in 0..size {
            let len = v.len();
            set.free(v.swap_remove(rand::random::<usize>() % len));
        }
    }

    for i in v {
        set.free(i);
    }

    for index in 0..50 {
        let handle = set.create();
        assert_eq!(handle.index(), index);
    }
}

#[test]
fn typed_handles() {
    let mut set = HandleObjectPool::new();

    let raw = set.create(7u32);
    let sampler: SamplerHandle = raw.into();
    assert_eq!(set.get(sampler), Some(&7));
    assert_eq!(Handle::from(sampler), raw);
    assert_eq!(format!("{}", sampler), "SamplerHandle (0, 1)");

    set.free(sampler);
    let reused: SamplerHandle = set.create(8).into();
    assert_eq!(reused.index(), sampler.index());
    assert_ne!(reused, sampler);
    assert_eq!(set.get(sampler), None);
}
