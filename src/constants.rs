/// 历史缓冲区默认容量（帧）
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// 中心位移检测默认窗口（相邻帧对数）
pub const DEFAULT_SHIFT_WINDOW: usize = 5;

/// 默认连续触发帧数阈值
pub const DEFAULT_CONSECUTIVE_FRAMES: u32 = 5;

/// 默认告警冷却时间（秒）
pub const DEFAULT_COOLDOWN_SECS: f64 = 30.0;

/// 头部下降阈值的参考像素值（对应参考画面高度）
pub const DEFAULT_HEAD_DROP_PX: f64 = 100.0;

/// 参考画面高度（像素），用于把像素阈值归一化
pub const REFERENCE_FRAME_HEIGHT_PX: f64 = 480.0;

/// 身体中心位移默认阈值（像素）
pub const DEFAULT_CENTER_SHIFT_PX: f64 = 150.0;

/// 参与交叉验证的规则总数，置信度的分母
pub const RULE_COUNT: usize = 3;

/// 严重等级的置信度放大系数
pub const SEVERE_CONFIDENCE_BOOST: f64 = 1.2;

/// 基准线比较时头部下降阈值的倍数
pub const BASELINE_HEAD_DROP_MULTIPLIER: f64 = 2.0;

/// 默认监测对象标识
pub const DEFAULT_SUBJECT_ID: &str = "subject-0";
