/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Interface queries through `ioctl(2)` on a datagram socket

use crate::domain::SystemError;
use crate::ports::InterfaceQuery;
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

/// `struct ifreq` is 40 bytes on 64-bit Linux: a 16 byte name, then the union
const IFREQ_SIZE: usize = 40;
const IFNAMSIZ: usize = 16;
/// Offset of `sin_addr` inside `ifr_netmask` (family and port come first)
const SIN_ADDR_OFFSET: usize = IFNAMSIZ + 4;

/// Reads interface settings with `SIOCGIFNETMASK`
#[derive(Debug, Default)]
pub struct IoctlInterfaceQuery;

impl IoctlInterfaceQuery {
    pub fn new() -> Self {
        Self
    }
}

fn ifreq_for(interface: &str) -> Result<[u8; IFREQ_SIZE], SystemError> {
    let name = interface.as_bytes();
    if name.is_empty() || name.len() >= IFNAMSIZ || name.contains(&0) {
        return Err(SystemError::ParseError(format!(
            "Invalid interface name: {interface:?}"
        )));
    }

    let mut request = [0u8; IFREQ_SIZE];
    request[..name.len()].copy_from_slice(name);
    Ok(request)
}

fn inet_socket() -> Result<OwnedFd, SystemError> {
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
    if fd < 0 {
        return Err(SystemError::IoError(format!(
            "socket: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

#[async_trait]
impl InterfaceQuery for IoctlInterfaceQuery {
    async fn netmask(&self, interface: &str) -> Result<String, SystemError> {
        let mut request = ifreq_for(interface)?;
        let socket = inet_socket()?;

        let rc = unsafe {
            libc::ioctl(
                socket.as_raw_fd(),
                libc::SIOCGIFNETMASK as _,
                request.as_mut_ptr(),
            )
        };
        if rc < 0 {
            return Err(SystemError::IoError(format!(
                "SIOCGIFNETMASK on {interface}: {}",
                std::io::Error::last_os_error()
            )));
        }

        let octets = &request[SIN_ADDR_OFFSET..SIN_ADDR_OFFSET + 4];
        Ok(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]).to_string())
    }
}
