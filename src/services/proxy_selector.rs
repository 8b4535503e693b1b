//! 代理选择服务 - 业务能力层
//!
//! 从配置池中供给出口代理描述。只负责"给出候选"：
//! 代理健康与重试是调用方的事，这里没有任何退避逻辑。
//! 轮询游标是分发工作协程之间唯一共享的可变状态，必须原子推进。

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::models::{ProxyDescriptor, RawProxyEntry};

/// 游标哨兵：尚未发放过任何代理
const NONE_YET: usize = usize::MAX;

/// 代理选择器
pub struct ProxySelector {
    pool: Vec<ProxyDescriptor>,
    cursor: AtomicUsize,
    last_issued: AtomicUsize,
}

impl ProxySelector {
    pub fn new(pool: Vec<ProxyDescriptor>) -> Self {
        Self {
            pool,
            cursor: AtomicUsize::new(0),
            last_issued: AtomicUsize::new(NONE_YET),
        }
    }

    /// 从原始配置条目归一化构建；无法归一化的条目告警丢弃
    pub fn from_entries(entries: &[RawProxyEntry]) -> Self {
        let mut pool = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.normalize() {
                Some(proxy) => pool.push(proxy),
                None => warn!("代理条目缺少地址，已丢弃一条"),
            }
        }
        debug!("代理池大小: {}", pool.len());
        Self::new(pool)
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// 轮询取下一个；空池返回 None，调用方直连即可
    pub fn next(&self) -> Option<ProxyDescriptor> {
        if self.pool.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        self.last_issued.store(idx, Ordering::Relaxed);
        Some(self.pool[idx].clone())
    }

    /// 随机取一个（不推进轮询游标）
    pub fn random(&self) -> Option<ProxyDescriptor> {
        if self.pool.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..self.pool.len());
        self.last_issued.store(idx, Ordering::Relaxed);
        Some(self.pool[idx].clone())
    }

    /// 最近一次发放的代理
    pub fn current(&self) -> Option<ProxyDescriptor> {
        match self.last_issued.load(Ordering::Relaxed) {
            NONE_YET => None,
            idx => self.pool.get(idx).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(n: usize) -> Vec<ProxyDescriptor> {
        (0..n)
            .map(|i| ProxyDescriptor {
                server: format!("http://gw{}.example:8080", i),
                username: None,
                password: None,
                country: None,
            })
            .collect()
    }

    #[test]
    fn round_robin_visits_each_exactly_once_per_cycle() {
        let selector = ProxySelector::new(pool_of(3));

        for _cycle in 0..2 {
            let mut seen = Vec::new();
            for _ in 0..3 {
                seen.push(selector.next().expect("池非空").server);
            }
            seen.sort();
            assert_eq!(
                seen,
                vec![
                    "http://gw0.example:8080",
                    "http://gw1.example:8080",
                    "http://gw2.example:8080"
                ]
            );
        }
    }

    #[test]
    fn empty_pool_consistently_returns_none() {
        let selector = ProxySelector::new(vec![]);
        assert!(selector.next().is_none());
        assert!(selector.random().is_none());
        assert!(selector.current().is_none());
        assert!(selector.next().is_none());
    }

    #[test]
    fn current_tracks_last_issued() {
        let selector = ProxySelector::new(pool_of(2));
        assert!(selector.current().is_none());

        let first = selector.next().expect("池非空");
        assert_eq!(selector.current().expect("已发放过").server, first.server);
    }

    #[test]
    fn random_stays_within_pool() {
        let selector = ProxySelector::new(pool_of(4));
        for _ in 0..20 {
            let proxy = selector.random().expect("池非空");
            assert!(proxy.server.starts_with("http://gw"));
        }
    }
}
