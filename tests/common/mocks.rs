//! Mock byte streams standing in for files and sockets.
use mockall::mock;

use std::io::{self, Read, Write};

mock! {
    pub Output {}
    impl Write for Output {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
        fn flush(&mut self) -> io::Result<()>;
    }
}

mock! {
    pub Input {}
    impl Read for Input {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    }
}
