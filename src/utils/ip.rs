//! IP 地址处理工具
//!
//! 提供统一的客户端 IP 提取功能，支持：
//! - 可信代理配置（trusted_proxies）
//! - CIDR 匹配
//! - 私有 IP 自动检测

use std::net::{IpAddr, SocketAddr};

use actix_web::dev::ConnectionInfo;
use actix_web::http::header::HeaderMap;
use tracing::debug;

/// Placeholder used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

fn parse_peer(ip: &str) -> Option<IpAddr> {
    ip.parse::<SocketAddr>()
        .map(|s| s.ip())
        .or_else(|_| ip.parse::<IpAddr>())
        .ok()
}

/// 检查 IP 是否在可信代理列表中
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip_addr) = parse_peer(ip) else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == ip_addr)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            if prefix_len > 32 {
                return false;
            }
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u32::from_be_bytes(ip.octets());
            let net_bits = u32::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            if prefix_len > 128 {
                return false;
            }
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            let ip_bits = u128::from_be_bytes(ip.octets());
            let net_bits = u128::from_be_bytes(net.octets());
            (ip_bits & mask) == (net_bits & mask)
        }
        _ => false, // IPv4 vs IPv6 不匹配
    }
}

/// 从连接信息和请求头提取真实客户端 IP
///
/// 策略（按优先级）：
/// 1. 显式配置 trusted_proxies 且 peer 匹配 → 使用转发头
/// 2. 未配置 trusted_proxies 且 peer 为私有 IP → 自动识别为代理，使用转发头
/// 3. 默认 → 使用连接 IP（公网直连场景，防止伪造）
pub fn extract_client_ip(
    conn_info: &ConnectionInfo,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> String {
    let Some(peer) = conn_info.peer_addr() else {
        return extract_forwarded_ip(headers).unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    };
    let peer_ip = parse_peer(peer)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| peer.to_string());

    if !trusted_proxies.is_empty() {
        if is_trusted_proxy(peer, trusted_proxies) {
            let real_ip = extract_forwarded_ip(headers).unwrap_or_else(|| peer_ip.clone());
            debug!("Trusted proxy (explicit): {} -> {}", peer_ip, real_ip);
            return real_ip;
        }
        return peer_ip;
    }

    if parse_peer(peer).is_some_and(|ip| is_private_or_local(&ip))
        && let Some(real_ip) = extract_forwarded_ip(headers)
    {
        debug!("Auto-detect proxy (private IP {}): {}", peer_ip, real_ip);
        return real_ip;
    }

    peer_ip
}

/// 从请求头提取转发的 IP
///
/// 顺序：CF-Connecting-IP → X-Real-IP → X-Forwarded-For 的第一个地址。
/// 无法解析为 IP 的值会被跳过。
pub fn extract_forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

    [
        header("cf-connecting-ip"),
        header("x-real-ip"),
        header("x-forwarded-for").and_then(|s| s.split(',').next()),
    ]
    .into_iter()
    .flatten()
    .find_map(|value| value.trim().parse::<IpAddr>().ok())
    .map(|ip| ip.to_string())
}
