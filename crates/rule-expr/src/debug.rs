//! 调试开关
//!
//! 进程级的调试详细度，0 关闭。比较内核在级别 >= 1 时通过
//! tracing 输出每次比较的判定；输出端由调用方安装的 tracing
//! 订阅器决定，库本身不持有写句柄。

use std::sync::atomic::{AtomicI32, Ordering};

static DEBUG_LEVEL: AtomicI32 = AtomicI32::new(0);

/// 设置调试详细度（0 关闭）
pub fn set_debug_level(level: i32) {
    DEBUG_LEVEL.store(level, Ordering::Relaxed);
}

pub fn debug_level() -> i32 {
    DEBUG_LEVEL.load(Ordering::Relaxed)
}

pub(crate) fn enabled(level: i32) -> bool {
    debug_level() >= level
}
