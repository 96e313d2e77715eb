//! The `ZSECSENDCPRB` ioctl boundary, abstracted behind a trait so the
//! framing code can be exercised without a real coprocessor:
//! [`LinuxTransport`] issues the real ioctl against an open adapter,
//! [`SimulatedTransport`] answers requests with [`super::simulate`] and
//! can deliberately mangle reply lengths to drive the format-mismatch
//! handling.

use crate::error::Error;

use super::cprb::RequestBuffer;

/// A channel to the coprocessor: dispatch the request half of `buffer`,
/// fill its reply half.
pub(crate) trait Transport {
    fn send(&self, adapter: i32, buffer: &mut RequestBuffer) -> Result<(), Error>;
}

/// The real transport: an open adapter file descriptor and the zcrypt
/// ioctl.
#[cfg(target_arch = "s390x")]
pub(crate) struct LinuxTransport;

#[cfg(target_arch = "s390x")]
impl Transport for LinuxTransport {
    fn send(&self, adapter: i32, buffer: &mut RequestBuffer) -> Result<(), Error> {
        use super::cprb::{IcaXcrb, ZSECSENDCPRB};

        let mut xcrb = IcaXcrb::new(buffer);

        let rc = unsafe { libc::ioctl(adapter, ZSECSENDCPRB, &mut xcrb as *mut IcaXcrb) };
        if rc != 0 {
            log::warn!("ZSECSENDCPRB ioctl failed with rc={rc}");
            return Err(Error::HardwareFault("ZSECSENDCPRB ioctl failed"));
        }
        Ok(())
    }
}

/// A software stand-in for the card, used on every host this crate is
/// actually tested on. `corrupt_reply_len`, when set, asks the simulator
/// to shrink the length word ahead of a computed reply payload, so reply
/// validation can be exercised without faking an entire hardware failure
/// mode.
#[derive(Default)]
pub(crate) struct SimulatedTransport {
    pub(crate) corrupt_reply_len: bool,
}

impl Transport for SimulatedTransport {
    fn send(&self, _adapter: i32, buffer: &mut RequestBuffer) -> Result<(), Error> {
        let reply = super::simulate::execute(buffer.request(), self.corrupt_reply_len)?;
        super::cprb::write_reply(buffer.reply_half_mut(), reply.rtcode, reply.rscode, &reply.parm);
        Ok(())
    }
}
