//! 有序集合工具
//!
//! 缺失字段等诊断信息需要稳定的输出顺序，因此基于 BTreeSet 实现。

use std::collections::BTreeSet;
use std::fmt;

/// 小型有序集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Set<T: Ord>(BTreeSet<T>);

impl<T: Ord> Set<T> {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// 由单个元素构造
    pub fn from_item(item: T) -> Self {
        let mut set = BTreeSet::new();
        set.insert(item);
        Self(set)
    }

    pub fn insert(&mut self, item: T) {
        self.0.insert(item);
    }

    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    pub fn remove(&mut self, item: &T) {
        self.0.remove(item);
    }

    /// 合并另一个集合的全部元素
    pub fn merge(&mut self, other: Set<T>) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Ord + Clone> Set<T> {
    /// 按序返回全部元素
    pub fn items(&self) -> Vec<T> {
        self.0.iter().cloned().collect()
    }
}

/// 集合并集，忽略空集合
pub fn union<T: Ord>(sets: impl IntoIterator<Item = Set<T>>) -> Set<T> {
    let mut result = Set::new();
    for set in sets {
        result.merge(set);
    }
    result
}

impl<T: Ord> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Ord + fmt::Display> fmt::Display for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for item in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
            first = false;
        }
        Ok(())
    }
}
