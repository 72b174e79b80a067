use std::{
    fs, io,
    net::{IpAddr, UdpSocket},
    path::PathBuf,
};

use anyhow::{Context as _, Result};
use macaddr::MacAddr6;

// No packet is sent: connecting a UDP socket only selects the outbound route.
const IP_PROBE_TARGET: &str = "8.8.8.8:80";

/// Identity of the machine the sensors are attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub hostname: String,

    pub ip: Option<IpAddr>,

    pub machine_id: Option<String>,
}

impl HostContext {
    /// Detects the host identity. With `probe_ip` unset the IP is left empty.
    pub fn detect(probe_ip: bool) -> Result<Self> {
        let hostname = hostname().context("failed to read hostname")?;
        let ip = if probe_ip { outbound_ip() } else { None };
        let machine_id = machine_id(&MachineIdSource::defaults());

        Ok(Self {
            hostname,
            ip,
            machine_id,
        })
    }
}

fn hostname() -> io::Result<String> {
    let mut buf = [0u8; 256];

    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());

    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Local address of the interface that routes to the outside world.
fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(IP_PROBE_TARGET).ok()?;

    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

/// One way of obtaining a stable machine identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineIdSource {
    /// A file holding the id, such as `/etc/machine-id`.
    File(PathBuf),

    /// The first non-loopback hardware address found under a sysfs
    /// `class/net` directory, rendered as a decimal 48-bit integer.
    HardwareAddress(PathBuf),
}

impl MachineIdSource {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::File("/etc/machine-id".into()),
            Self::File("/var/lib/dbus/machine-id".into()),
            Self::HardwareAddress("/sys/class/net".into()),
        ]
    }

    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::File(path) => {
                let id = fs::read_to_string(path).ok()?;
                let id = id.trim();
                (!id.is_empty()).then(|| id.to_string())
            }
            Self::HardwareAddress(net_dir) => {
                let mut interfaces: Vec<PathBuf> = fs::read_dir(net_dir)
                    .ok()?
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_name() != "lo")
                    .map(|entry| entry.path())
                    .collect();
                interfaces.sort();

                interfaces.iter().find_map(|interface| {
                    let address = fs::read_to_string(interface.join("address")).ok()?;
                    let mac: MacAddr6 = address.trim().parse().ok()?;
                    (!mac.is_nil()).then(|| mac_to_integer(&mac).to_string())
                })
            }
        }
    }
}

/// First identifier produced by `sources`, tried in order.
pub fn machine_id(sources: &[MachineIdSource]) -> Option<String> {
    sources.iter().find_map(MachineIdSource::resolve)
}

fn mac_to_integer(mac: &MacAddr6) -> u64 {
    mac.as_bytes()
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
