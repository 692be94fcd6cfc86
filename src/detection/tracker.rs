//! 姿态特征时序追踪模块
//!
//! 为躯干角度、身体中心、头部高度各维护一个固定容量的环形缓冲区，
//! 提供均值、最近一帧变化量、窗口内最大相邻位移等统计。

use std::collections::VecDeque;

use crate::detection::types::Point;

/// 固定容量 FIFO，写满后丢弃最旧样本
#[derive(Debug, Clone)]
pub struct History<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> History<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<T> {
        self.samples.back().copied()
    }

    /// 最近两个样本 (上一帧, 当前帧)
    pub fn last_pair(&self) -> Option<(T, T)> {
        let n = self.samples.len();
        if n < 2 {
            return None;
        }
        Some((self.samples[n - 2], self.samples[n - 1]))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// 标量信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    TorsoAngle,
    HeadHeight,
}

/// 时序追踪器
#[derive(Debug, Clone)]
pub struct TemporalTracker {
    torso: History<f64>,
    centers: History<Point>,
    head: History<f64>,
}

impl TemporalTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            torso: History::new(capacity),
            centers: History::new(capacity),
            head: History::new(capacity),
        }
    }

    /// 写入一帧特征；缺失的特征本帧不入队
    pub fn update(
        &mut self,
        torso_angle: Option<f64>,
        center: Option<Point>,
        head_height: Option<f64>,
    ) {
        if let Some(angle) = torso_angle {
            self.torso.push(angle);
        }
        if let Some(c) = center {
            self.centers.push(c);
        }
        if let Some(h) = head_height {
            self.head.push(h);
        }
    }

    fn scalar(&self, signal: Signal) -> &History<f64> {
        match signal {
            Signal::TorsoAngle => &self.torso,
            Signal::HeadHeight => &self.head,
        }
    }

    pub fn average(&self, signal: Signal) -> Option<f64> {
        let history = self.scalar(signal);
        if history.is_empty() {
            return None;
        }
        Some(history.iter().sum::<f64>() / history.len() as f64)
    }

    /// 当前帧减上一帧；样本不足两个时返回 `None`
    pub fn last_delta(&self, signal: Signal) -> Option<f64> {
        self.scalar(signal)
            .last_pair()
            .map(|(prev, curr)| curr - prev)
    }

    pub fn average_center(&self) -> Option<Point> {
        if self.centers.is_empty() {
            return None;
        }
        let n = self.centers.len() as f64;
        let (sx, sy) = self
            .centers
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / n, sy / n))
    }

    pub fn last_center_shift(&self) -> Option<f64> {
        self.centers
            .last_pair()
            .map(|(prev, curr)| curr.distance(&prev))
    }

    /// 最近 `min(window, len-1)` 对相邻中心点间距离的最大值
    ///
    /// 取相邻帧位移的最大值而非首尾净位移，用于区分单次剧烈跳变与缓慢漂移。
    pub fn max_center_shift(&self, window: usize) -> Option<f64> {
        let n = self.centers.len();
        if n < 2 {
            return None;
        }
        let pairs = window.min(n - 1);
        if pairs == 0 {
            return None;
        }
        self.centers
            .iter()
            .skip(n - pairs - 1)
            .zip(self.centers.iter().skip(n - pairs))
            .map(|(prev, curr)| curr.distance(prev))
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))))
    }

    pub fn len(&self, signal: Signal) -> usize {
        self.scalar(signal).len()
    }

    pub fn center_len(&self) -> usize {
        self.centers.len()
    }

    pub fn capacity(&self) -> usize {
        self.torso.capacity()
    }

    pub fn reset(&mut self) {
        self.torso.clear();
        self.centers.clear();
        self.head.clear();
    }
}
