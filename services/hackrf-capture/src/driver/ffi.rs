//! libhackrf binding
//!
//! Thin wrapper over the C API. `setup` initializes the library and opens the
//! first device, `exit` closes it and releases the library.

use std::os::raw::{c_int, c_void};
use std::ptr;
use tracing::{debug, warn};

use super::{NativeDriver, RxCallback, Status};

#[repr(C)]
#[allow(dead_code)]
struct HackrfTransfer {
    device: *mut c_void,
    buffer: *mut u8,
    buffer_length: c_int,
    valid_length: c_int,
    rx_ctx: *mut c_void,
    tx_ctx: *mut c_void,
}

type HackrfDevice = c_void;

extern "C" {
    fn hackrf_init() -> c_int;
    fn hackrf_exit() -> c_int;
    fn hackrf_open(device: *mut *mut HackrfDevice) -> c_int;
    fn hackrf_close(device: *mut HackrfDevice) -> c_int;
    fn hackrf_start_rx(
        device: *mut HackrfDevice,
        callback: unsafe extern "C" fn(*mut HackrfTransfer) -> c_int,
        rx_ctx: *mut c_void,
    ) -> c_int;
    fn hackrf_stop_rx(device: *mut HackrfDevice) -> c_int;
    fn hackrf_set_baseband_filter_bandwidth(device: *mut HackrfDevice, bandwidth_hz: u32) -> c_int;
    fn hackrf_set_freq(device: *mut HackrfDevice, freq_hz: u64) -> c_int;
    fn hackrf_set_lna_gain(device: *mut HackrfDevice, value: u32) -> c_int;
    fn hackrf_set_vga_gain(device: *mut HackrfDevice, value: u32) -> c_int;
    fn hackrf_set_txvga_gain(device: *mut HackrfDevice, value: u32) -> c_int;
    fn hackrf_set_sample_rate(device: *mut HackrfDevice, freq_hz: f64) -> c_int;
}

/// Context passed to the libhackrf RX callback
struct RxContext {
    callback: RxCallback,
}

unsafe extern "C" fn rx_trampoline(transfer: *mut HackrfTransfer) -> c_int {
    let transfer = &*transfer;
    let ctx = &*(transfer.rx_ctx as *const RxContext);
    let valid = transfer.valid_length.max(0) as usize;

    if valid > 0 && !transfer.buffer.is_null() {
        let chunk = std::slice::from_raw_parts(transfer.buffer, valid);
        (ctx.callback)(chunk);
    }

    0
}

/// Native HackRF driver backed by the system libhackrf
pub struct LibHackrf {
    dev: *mut HackrfDevice,
    ctx: *mut RxContext,
}

// The device handle is only touched from the owning control thread
unsafe impl Send for LibHackrf {}

impl LibHackrf {
    pub fn new() -> Self {
        Self {
            dev: ptr::null_mut(),
            ctx: ptr::null_mut(),
        }
    }

    fn release_ctx(&mut self) {
        if !self.ctx.is_null() {
            unsafe {
                drop(Box::from_raw(self.ctx));
            }
            self.ctx = ptr::null_mut();
        }
    }

    fn with_device(&mut self, call: impl FnOnce(*mut HackrfDevice) -> c_int) -> Status {
        if self.dev.is_null() {
            return Status::Failure(-1);
        }
        Status::from_code(call(self.dev))
    }
}

impl Default for LibHackrf {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeDriver for LibHackrf {
    fn setup(&mut self) -> Status {
        unsafe {
            let r = Status::from_code(hackrf_init());
            if !r.is_success() {
                return r;
            }

            let mut dev: *mut HackrfDevice = ptr::null_mut();
            let r = Status::from_code(hackrf_open(&mut dev));
            if !r.is_success() {
                hackrf_exit();
                return r;
            }

            debug!("libhackrf device opened");
            self.dev = dev;
            Status::Success
        }
    }

    fn exit(&mut self) -> Status {
        unsafe {
            if !self.dev.is_null() {
                // hackrf_close stops any rx still running and joins its
                // transfer thread, so the context below is unreferenced
                let r = Status::from_code(hackrf_close(self.dev));
                if !r.is_success() {
                    return r;
                }
                self.dev = ptr::null_mut();
            }
            self.release_ctx();
            Status::from_code(hackrf_exit())
        }
    }

    fn start_rx(&mut self, callback: RxCallback) -> Status {
        if self.dev.is_null() {
            return Status::Failure(-1);
        }
        self.release_ctx();

        let ctx = Box::into_raw(Box::new(RxContext { callback }));
        let r = unsafe { Status::from_code(hackrf_start_rx(self.dev, rx_trampoline, ctx as *mut c_void)) };

        if r.is_success() {
            self.ctx = ctx;
        } else {
            unsafe {
                drop(Box::from_raw(ctx));
            }
        }
        r
    }

    fn stop_rx(&mut self) -> Status {
        let r = self.with_device(|dev| unsafe { hackrf_stop_rx(dev) });
        if r.is_success() {
            // libhackrf has joined its transfer thread; the context is unreferenced
            self.release_ctx();
        }
        r
    }

    fn set_baseband_filter_bandwidth(&mut self, bandwidth_hz: u32) -> Status {
        self.with_device(|dev| unsafe { hackrf_set_baseband_filter_bandwidth(dev, bandwidth_hz) })
    }

    fn set_freq(&mut self, freq_hz: u64) -> Status {
        self.with_device(|dev| unsafe { hackrf_set_freq(dev, freq_hz) })
    }

    fn set_lna_gain(&mut self, gain: u32) -> Status {
        self.with_device(|dev| unsafe { hackrf_set_lna_gain(dev, gain) })
    }

    fn set_vga_gain(&mut self, gain: u32) -> Status {
        self.with_device(|dev| unsafe { hackrf_set_vga_gain(dev, gain) })
    }

    fn set_txvga_gain(&mut self, gain: u32) -> Status {
        self.with_device(|dev| unsafe { hackrf_set_txvga_gain(dev, gain) })
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Status {
        self.with_device(|dev| unsafe { hackrf_set_sample_rate(dev, sample_rate as f64) })
    }
}

impl Drop for LibHackrf {
    fn drop(&mut self) {
        if !self.dev.is_null() {
            warn!("LibHackrf dropped while open, closing device");
            unsafe {
                hackrf_stop_rx(self.dev);
                hackrf_close(self.dev);
                hackrf_exit();
            }
            self.dev = ptr::null_mut();
        }
        self.release_ctx();
    }
}
