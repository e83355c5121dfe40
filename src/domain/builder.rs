//! Tree builder: turns a record bag into the six-section mind-map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::entities::{
    present, AssetMovementRecord, DeviceRecord, ExtraData, FieldValue, LoginLogRecord,
    RecordBag, SourceFileEntry, TransactionRecord, UserInfo, UserRecord,
};
use crate::domain::format::DisplayFormat;
use crate::domain::node::Node;
use crate::domain::stats::{AssetMovementStats, Distribution, TimeRange, TransactionStats};

pub const NO_DATA: &str = "暂无数据";
pub const UNKNOWN_USER: &str = "未知用户";
pub const UNKNOWN_IP: &str = "Unknown IP";
pub const UNKNOWN_TIME: &str = "未知时间";
pub const UNKNOWN_DEVICE: &str = "未知设备";

/// Truncation caps applied to list-derived sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Assets listed under the transaction asset distribution
    pub asset_distribution: usize,
    /// Networks listed under the asset-movement network distribution
    pub network_distribution: usize,
    /// IP buckets in the login section
    pub login_ips: usize,
    /// Login records listed per IP bucket
    pub records_per_ip: usize,
    /// Devices listed in the device section
    pub devices: usize,
    /// Extra-data fields listed per device
    pub extra_fields: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            asset_distribution: 10,
            network_distribution: 5,
            login_ips: 10,
            records_per_ip: 5,
            devices: 20,
            extra_fields: 5,
        }
    }
}

/// Builds mind-map trees. Holds only formatting policy and caps, so one
/// builder can be reused (and shared across threads) for any number of bags.
pub struct MindMapBuilder<'a> {
    format: &'a dyn DisplayFormat,
    limits: Limits,
}

impl<'a> MindMapBuilder<'a> {
    pub fn new(format: &'a dyn DisplayFormat) -> Self {
        Self {
            format,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Build the tree; a missing bag gives the `暂无数据` placeholder root.
    #[instrument(level = "debug", skip_all)]
    pub fn build(&self, bag: Option<&RecordBag>, user_info: Option<&UserInfo>) -> Node {
        match bag {
            Some(bag) => self.build_bag(bag, user_info),
            None => {
                debug!("no record bag, emitting placeholder root");
                Node::branch(NO_DATA, false, Vec::new())
            }
        }
    }

    pub fn build_bag(&self, bag: &RecordBag, user_info: Option<&UserInfo>) -> Node {
        debug!(
            users = bag.users.len(),
            transactions = bag.transactions.len(),
            asset_movements = bag.asset_movements.len(),
            login_logs = bag.login_logs.len(),
            devices = bag.devices.len(),
            source_files = bag.source_files.len(),
            "building mind-map"
        );
        Node::branch(
            root_title(bag, user_info),
            true,
            vec![
                self.users_section(&bag.users),
                self.transactions_section(&bag.transactions),
                self.asset_movements_section(&bag.asset_movements),
                self.login_logs_section(&bag.login_logs),
                self.devices_section(&bag.devices),
                self.source_files_section(&bag.source_files),
            ],
        )
    }

    pub fn users_section(&self, users: &[UserRecord]) -> Node {
        let mut children = Vec::new();

        if let Some(user) = users.first() {
            push_field(&mut children, "姓名", &user.name);
            push_field(&mut children, "电话", &user.phone_number);
            push_field(&mut children, "邮箱", &user.email);
            if let Some(t) = present(&user.registration_time) {
                children.push(Node::leaf(format!("注册时间: {}", self.format.localized(t))));
            }
            push_field(&mut children, "数据来源", &user.source);
        }

        if children.is_empty() {
            children.push(Node::leaf("暂无用户信息"));
        }

        section(format!("用户信息 ({}条记录)", users.len()), children)
    }

    pub fn transactions_section(&self, transactions: &[TransactionRecord]) -> Node {
        let label = format!("交易统计 ({}条记录)", transactions.len());
        if transactions.is_empty() {
            return section(label, vec![Node::leaf("暂无交易记录")]);
        }

        let stats = TransactionStats::collect(transactions, self.format);
        let mut children = vec![Node::leaf(format!("总交易笔数: {}", stats.total_count))];

        if stats.unique_assets > 0 {
            children.push(Node::leaf(format!("涉及币种数: {}", stats.unique_assets)));
        }
        if stats.total_amount > 0.0 {
            children.push(Node::leaf(format!(
                "总交易金额: {}",
                self.format.number(stats.total_amount)
            )));
        }
        if let Some(range) = &stats.time_range {
            children.push(self.time_range_leaf(range));
        }
        if !stats.type_distribution.is_empty() {
            children.push(distribution_node(
                "交易类型分布",
                all_entries(&stats.type_distribution),
            ));
        }
        if !stats.asset_distribution.is_empty() {
            children.push(distribution_node(
                "主要币种分布",
                stats.asset_distribution.top(self.limits.asset_distribution),
            ));
        }

        section(label, children)
    }

    pub fn asset_movements_section(&self, movements: &[AssetMovementRecord]) -> Node {
        let label = format!("资产流水统计 ({}条记录)", movements.len());
        if movements.is_empty() {
            return section(label, vec![Node::leaf("暂无资产流水记录")]);
        }

        let stats = AssetMovementStats::collect(movements, self.format);
        let mut children = vec![Node::leaf(format!("总流水笔数: {}", stats.total_count))];

        if stats.unique_assets > 0 {
            children.push(Node::leaf(format!("涉及资产种类: {}", stats.unique_assets)));
        }
        if stats.total_quantity > 0.0 {
            children.push(Node::leaf(format!(
                "总流水数量: {}",
                self.format.number(stats.total_quantity)
            )));
        }
        if let Some(range) = &stats.time_range {
            children.push(self.time_range_leaf(range));
        }
        if !stats.direction_distribution.is_empty() {
            children.push(distribution_node(
                "流水方向分布",
                all_entries(&stats.direction_distribution),
            ));
        }
        if !stats.network_distribution.is_empty() {
            children.push(distribution_node(
                "主要网络分布",
                stats.network_distribution.top(self.limits.network_distribution),
            ));
        }

        section(label, children)
    }

    pub fn login_logs_section(&self, logs: &[LoginLogRecord]) -> Node {
        let label = format!("登录日志统计 ({}条记录)", logs.len());
        if logs.is_empty() {
            return section(label, vec![Node::leaf("暂无登录记录")]);
        }

        // buckets in first-seen order, then a stable sort by size
        let mut buckets: Vec<(String, Vec<&LoginLogRecord>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for log in logs {
            let ip = present(&log.login_ip)
                .map(|v| v.to_string())
                .unwrap_or_else(|| UNKNOWN_IP.to_string());
            match index.get(&ip) {
                Some(&pos) => buckets[pos].1.push(log),
                None => {
                    index.insert(ip.clone(), buckets.len());
                    buckets.push((ip, vec![log]));
                }
            }
        }
        let bucket_count = buckets.len();
        buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        debug!(ips = bucket_count, "grouped login logs");

        let per_ip = self.limits.records_per_ip;
        let mut children: Vec<Node> = buckets
            .iter()
            .take(self.limits.login_ips)
            .map(|(ip, records)| {
                let mut leaves: Vec<Node> = records
                    .iter()
                    .take(per_ip)
                    .map(|log| Node::leaf(self.login_line(log)))
                    .collect();
                if records.len() > per_ip {
                    leaves.push(Node::leaf(format!(
                        "... 还有 {} 条记录",
                        records.len() - per_ip
                    )));
                }
                Node::branch(format!("{} ({}次)", ip, records.len()), false, leaves)
            })
            .collect();

        if bucket_count > self.limits.login_ips {
            children.push(Node::leaf(format!(
                "... 还有 {} 个其他IP地址",
                bucket_count - self.limits.login_ips
            )));
        }

        section(label, children)
    }

    pub fn devices_section(&self, devices: &[DeviceRecord]) -> Node {
        let label = format!("设备信息 ({}台设备)", devices.len());
        if devices.is_empty() {
            return section(label, vec![Node::leaf("暂无设备信息")]);
        }

        let cap = self.limits.devices;
        let mut children: Vec<Node> = devices
            .iter()
            .take(cap)
            .enumerate()
            .map(|(i, device)| self.device_node(i, device))
            .collect();

        if devices.len() > cap {
            children.push(Node::leaf(format!("... 还有 {} 台设备", devices.len() - cap)));
        }

        section(label, children)
    }

    pub fn source_files_section(&self, files: &[SourceFileEntry]) -> Node {
        let label = format!("Excel源文件 ({}个文件)", files.len());
        if files.is_empty() {
            return section(label, vec![Node::leaf("暂无源文件信息")]);
        }

        let children = files
            .iter()
            .enumerate()
            .map(|(i, entry)| match entry {
                SourceFileEntry::Detailed(file) => {
                    let mut leaves = Vec::new();
                    push_field(&mut leaves, "原文件名", &file.original_filename);
                    push_field(&mut leaves, "文件大小", &file.file_size);
                    push_field(&mut leaves, "上传时间", &file.upload_time);
                    push_field(&mut leaves, "平台", &file.platform);
                    if let Some(count) = &file.record_count {
                        leaves.push(Node::leaf(format!("记录数量: {}条", count)));
                    }
                    push_field(&mut leaves, "处理状态", &file.status);

                    let title = present(&file.original_filename)
                        .or_else(|| present(&file.file_name))
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| format!("文件{}", i + 1));
                    Node::branch(title, false, leaves)
                }
                SourceFileEntry::Legacy(name) => Node::leaf(
                    present(name)
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| format!("文件{}", i + 1)),
                ),
            })
            .collect();

        section(label, children)
    }

    fn device_node(&self, i: usize, device: &DeviceRecord) -> Node {
        let mut leaves = Vec::new();
        push_field(&mut leaves, "设备ID", &device.device_id);
        push_field(&mut leaves, "客户端类型", &device.client_type);
        push_field(&mut leaves, "IP地址", &device.ip_address);
        if let Some(t) = present(&device.add_time) {
            leaves.push(Node::leaf(format!("添加时间: {}", self.format.localized(t))));
        }
        push_field(&mut leaves, "数据来源", &device.source);

        match &device.extra_data {
            Some(ExtraData::Fields(fields)) => {
                let cap = self.limits.extra_fields;
                for (key, value) in fields.iter().take(cap) {
                    if !is_blank(value) {
                        leaves.push(Node::leaf(format!("{}: {}", key, value)));
                    }
                }
                if fields.len() > cap {
                    leaves.push(Node::leaf(format!("... 还有 {} 个字段", fields.len() - cap)));
                }
            }
            Some(ExtraData::Raw(raw)) => leaves.push(Node::leaf(format!("额外数据: {}", raw))),
            None => {}
        }

        let title = present(&device.device_id)
            .or_else(|| present(&device.client_type))
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("设备{}", i + 1));
        Node::branch(title, false, leaves)
    }

    fn login_line(&self, log: &LoginLogRecord) -> String {
        let time = present(&log.login_time)
            .map(|t| self.format.localized(t))
            .unwrap_or_else(|| UNKNOWN_TIME.to_string());
        let device = present(&log.device_id)
            .map(|d| d.to_string())
            .unwrap_or_else(|| UNKNOWN_DEVICE.to_string());
        format!("{} | 设备: {}", time, device)
    }

    fn time_range_leaf(&self, range: &TimeRange) -> Node {
        Node::leaf(format!(
            "时间范围: {} 至 {}",
            self.format.date(&range.start),
            self.format.date(&range.end)
        ))
    }
}

/// Root title from the first identity source that has a value.
pub fn root_title(bag: &RecordBag, user_info: Option<&UserInfo>) -> String {
    let first_user = bag.users.first();
    let id = user_info
        .and_then(|u| present(&u.user_id))
        .or_else(|| first_user.and_then(|u| present(&u.user_id)))
        .or_else(|| bag.transactions.first().and_then(|t| present(&t.user_id)))
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN_USER.to_string());
    let name = user_info
        .and_then(|u| present(&u.name))
        .or_else(|| first_user.and_then(|u| present(&u.name)));

    match name {
        Some(name) => format!("{} ({}) 调证数据", name, id),
        None => format!("用户 {} 调证数据", id),
    }
}

fn section(label: String, children: Vec<Node>) -> Node {
    Node::branch(label, true, children)
}

fn push_field(children: &mut Vec<Node>, label: &str, field: &Option<FieldValue>) {
    if let Some(value) = present(field) {
        children.push(Node::leaf(format!("{}: {}", label, value)));
    }
}

fn is_blank(value: &FieldValue) -> bool {
    match value.as_value() {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn all_entries(distribution: &Distribution) -> Vec<(&str, usize)> {
    distribution
        .entries()
        .iter()
        .map(|(k, n)| (k.as_str(), *n))
        .collect()
}

fn distribution_node(label: &str, entries: Vec<(&str, usize)>) -> Node {
    let leaves = entries
        .into_iter()
        .map(|(category, count)| Node::leaf(format!("{}: {}笔", category, count)))
        .collect();
    Node::branch(label, false, leaves)
}
