use std::io::Write;

/// Abstract the host environment to enable testing
pub trait Host: Send + Sync {
    // where to send normal output (e.g., stdout)
    fn output(&mut self) -> impl Write;
}

/// Test host that captures output to an in-memory buffer
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        std::io::Cursor::new(&mut self.output_buf)
    }
}
