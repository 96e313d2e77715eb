//! CPRBX request/reply envelope and the `ica_xcRB` ioctl descriptor.
//!
//! Every multi-byte numeric field is written and read big-endian at an
//! explicit offset; the structures are never reinterpreted from native
//! struct layout, since the firmware on the far side of the ioctl has
//! its own fixed notion of where each field lives. The exception is
//! [`IcaXcrb`], which is consumed by the local kernel driver rather
//! than the card and therefore is a `#[repr(C)]` mirror of the driver's
//! definition.

use crate::error::Error;
use crate::scrub::scrub;

/// Size of the CPRBX header on the wire.
pub(crate) const CPRBX_SIZE: usize = 224;

/// Maximum size of the parameter block following a CPRBX.
pub(crate) const PARM_BLOCK_MAX: usize = 2048;

pub(crate) const CPRB_VER_ID: u8 = 0x02;
pub(crate) const FUNC_ID: [u8; 2] = *b"T2";

/// `ica_xcRB.agent_ID` for CCA-format requests.
#[cfg(target_arch = "s390x")]
const AGENT_ID: u16 = 0x4341;

/// `ica_xcRB.user_defined` value asking the driver to pick any online
/// card.
#[cfg(target_arch = "s390x")]
const AUTOSELECT: u32 = 0xFFFF_FFFF;

/// `_IOWR('z', 0x81, 0)`, the zcrypt send-CPRB ioctl request code.
#[cfg(target_arch = "s390x")]
pub(crate) const ZSECSENDCPRB: libc::c_ulong = 0xC000_7A81;

// CPRBX field offsets.
const OFF_CPRB_LEN: usize = 0;
const OFF_CPRB_VER_ID: usize = 2;
const OFF_FUNC_ID: usize = 6;
const OFF_REQ_PARML: usize = 12;
const OFF_RPL_MSGBL: usize = 20;
const OFF_RPL_PARML: usize = 24;
const OFF_REQ_PARMB: usize = 40;
const OFF_RPL_PARMB: usize = 56;
const OFF_CCP_RTCODE: usize = 72;
const OFF_CCP_RSCODE: usize = 74;
const OFF_DOMAIN: usize = 80;

fn put_u16(buf: &mut [u8], off: usize, value: u16) {
    buf[off..off + 2].copy_from_slice(&value.to_be_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, value: u32) {
    buf[off..off + 4].copy_from_slice(&value.to_be_bytes());
}

fn put_u64(buf: &mut [u8], off: usize, value: u64) {
    buf[off..off + 8].copy_from_slice(&value.to_be_bytes());
}

fn get_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([buf[off], buf[off + 1]])
}

fn get_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// The single allocation behind one coprocessor round trip: the request
/// CPRBX plus parameter block in the first half, pre-sized space for the
/// reply CPRBX plus reply parameter block in the second. The whole
/// allocation is scrubbed on drop, on every exit path, since the request
/// parameter block carries clear key material.
pub(crate) struct RequestBuffer {
    raw: Vec<u8>,
    req_parml: usize,
}

const HALF: usize = CPRBX_SIZE + PARM_BLOCK_MAX;

impl RequestBuffer {
    /// Frames `parm` behind a request CPRBX addressed to `domain`.
    pub(crate) fn new(parm: &[u8], domain: u16) -> Result<Self, Error> {
        if parm.len() > PARM_BLOCK_MAX {
            return Err(Error::Allocation("parameter block exceeds the request buffer"));
        }

        let mut raw = vec![0u8; 2 * HALF];

        let req_parmb = raw[CPRBX_SIZE..].as_ptr() as u64;
        let rpl_parmb = raw[HALF + CPRBX_SIZE..].as_ptr() as u64;

        {
            let cprb = &mut raw[..CPRBX_SIZE];
            put_u16(cprb, OFF_CPRB_LEN, CPRBX_SIZE as u16);
            cprb[OFF_CPRB_VER_ID] = CPRB_VER_ID;
            cprb[OFF_FUNC_ID..OFF_FUNC_ID + 2].copy_from_slice(&FUNC_ID);
            put_u32(cprb, OFF_REQ_PARML, parm.len() as u32);
            put_u32(cprb, OFF_RPL_MSGBL, (CPRBX_SIZE + PARM_BLOCK_MAX) as u32);
            put_u64(cprb, OFF_REQ_PARMB, req_parmb);
            put_u64(cprb, OFF_RPL_PARMB, rpl_parmb);
            put_u16(cprb, OFF_DOMAIN, domain);
        }
        raw[CPRBX_SIZE..CPRBX_SIZE + parm.len()].copy_from_slice(parm);

        Ok(Self { raw, req_parml: parm.len() })
    }

    /// The request CPRBX plus its parameter block.
    pub(crate) fn request(&self) -> &[u8] {
        &self.raw[..CPRBX_SIZE + self.req_parml]
    }

    #[cfg(target_arch = "s390x")]
    pub(crate) fn reply_capacity(&self) -> usize {
        HALF
    }

    pub(crate) fn reply_half(&self) -> &[u8] {
        &self.raw[HALF..]
    }

    pub(crate) fn reply_half_mut(&mut self) -> &mut [u8] {
        &mut self.raw[HALF..]
    }

    #[cfg(target_arch = "s390x")]
    pub(crate) fn request_ptr(&mut self) -> *mut u8 {
        self.raw.as_mut_ptr()
    }

    #[cfg(target_arch = "s390x")]
    pub(crate) fn reply_ptr(&mut self) -> *mut u8 {
        self.raw[HALF..].as_mut_ptr()
    }

    /// Return/reason code pair and parameter block of the reply.
    pub(crate) fn reply(&self) -> Result<CprbReply<'_>, Error> {
        let half = self.reply_half();
        let cprb = &half[..CPRBX_SIZE];

        if get_u16(cprb, OFF_CPRB_LEN) as usize != CPRBX_SIZE || cprb[OFF_CPRB_VER_ID] != CPRB_VER_ID {
            return Err(Error::FormatMismatch("reply CPRBX header is malformed"));
        }

        let parml = get_u32(cprb, OFF_RPL_PARML) as usize;
        if parml > PARM_BLOCK_MAX {
            return Err(Error::FormatMismatch("reply parameter block length exceeds the buffer"));
        }

        Ok(CprbReply {
            ccp_rtcode: get_u16(cprb, OFF_CCP_RTCODE),
            ccp_rscode: get_u16(cprb, OFF_CCP_RSCODE),
            parm: &half[CPRBX_SIZE..CPRBX_SIZE + parml],
        })
    }
}

impl Drop for RequestBuffer {
    fn drop(&mut self) {
        scrub(&mut self.raw);
    }
}

/// Parsed view of a reply CPRBX.
pub(crate) struct CprbReply<'a> {
    pub ccp_rtcode: u16,
    pub ccp_rscode: u16,
    pub parm: &'a [u8],
}

/// Writes a reply CPRBX plus parameter block into `half`. Used by the
/// simulated transport; the real coprocessor fills the reply half via
/// the driver.
pub(crate) fn write_reply(half: &mut [u8], rtcode: u16, rscode: u16, parm: &[u8]) {
    debug_assert!(parm.len() <= PARM_BLOCK_MAX);

    let cprb = &mut half[..CPRBX_SIZE];
    cprb.fill(0);
    put_u16(cprb, OFF_CPRB_LEN, CPRBX_SIZE as u16);
    cprb[OFF_CPRB_VER_ID] = CPRB_VER_ID;
    cprb[OFF_FUNC_ID..OFF_FUNC_ID + 2].copy_from_slice(&FUNC_ID);
    put_u32(cprb, OFF_RPL_PARML, parm.len() as u32);
    put_u16(cprb, OFF_CCP_RTCODE, rtcode);
    put_u16(cprb, OFF_CCP_RSCODE, rscode);

    half[CPRBX_SIZE..CPRBX_SIZE + parm.len()].copy_from_slice(parm);
}

/// Reads the request parameter block back out of a serialized request,
/// validating the envelope the same way firmware would.
pub(crate) fn read_request(request: &[u8]) -> Result<(u16, &[u8]), Error> {
    if request.len() < CPRBX_SIZE {
        return Err(Error::FormatMismatch("request shorter than a CPRBX header"));
    }
    let cprb = &request[..CPRBX_SIZE];
    if get_u16(cprb, OFF_CPRB_LEN) as usize != CPRBX_SIZE
        || cprb[OFF_CPRB_VER_ID] != CPRB_VER_ID
        || cprb[OFF_FUNC_ID..OFF_FUNC_ID + 2] != FUNC_ID
    {
        return Err(Error::FormatMismatch("request CPRBX header is malformed"));
    }

    let parml = get_u32(cprb, OFF_REQ_PARML) as usize;
    if request.len() < CPRBX_SIZE + parml {
        return Err(Error::FormatMismatch("request shorter than its declared parameter block"));
    }

    Ok((get_u16(cprb, OFF_DOMAIN), &request[CPRBX_SIZE..CPRBX_SIZE + parml]))
}

/// The descriptor handed to the `ZSECSENDCPRB` ioctl. Field layout
/// mirrors the zcrypt driver's definition.
#[cfg(target_arch = "s390x")]
#[repr(C, packed)]
pub(crate) struct IcaXcrb {
    pub agent_id: u16,
    pub user_defined: u32,
    pub request_id: u16,
    pub request_control_blk_length: u32,
    pub _padding1: [u8; 12],
    pub request_control_blk_addr: u64,
    pub request_data_length: u32,
    pub _padding2: [u8; 12],
    pub request_data_address: u64,
    pub reply_control_blk_length: u32,
    pub _padding3: [u8; 12],
    pub reply_control_blk_addr: u64,
    pub reply_data_length: u32,
    pub _padding4: [u8; 12],
    pub reply_data_addr: u64,
    pub priority_window: u16,
    pub status: u32,
}

#[cfg(target_arch = "s390x")]
impl IcaXcrb {
    pub(crate) fn new(buffer: &mut RequestBuffer) -> Self {
        let request_len = buffer.request().len() as u32;
        let reply_len = buffer.reply_capacity() as u32;
        Self {
            agent_id: AGENT_ID,
            user_defined: AUTOSELECT,
            request_id: 0,
            request_control_blk_length: request_len,
            _padding1: [0; 12],
            request_control_blk_addr: buffer.request_ptr() as u64,
            request_data_length: 0,
            _padding2: [0; 12],
            request_data_address: 0,
            reply_control_blk_length: reply_len,
            _padding3: [0; 12],
            reply_control_blk_addr: buffer.reply_ptr() as u64,
            reply_data_length: 0,
            _padding4: [0; 12],
            reply_data_addr: 0,
            priority_window: 0,
            status: 0,
        }
    }
}
