//! Универсальные трейты для приложений Market Server и Market Client.

use std::io::Write;

pub trait WriteExt {
    /// Отправляет в `Write` переданную текстовую строку, преобразуя её
    /// в байтовую.
    fn write_str(&mut self, s: impl AsRef<str>);
    /// Отправляет строку с завершающим переводом строки — кадр построчного
    /// протокола.
    fn write_line(&mut self, s: impl AsRef<str>);
    /// Обёртка для `writer.flush()`, скрывающая обработку `Result`.
    fn flush_ext(&mut self);
}

impl<W: Write> WriteExt for W {
    fn write_str(&mut self, s: impl AsRef<str>) {
        let _ = self.write_all(s.as_ref().as_bytes());
        self.flush_ext()
    }

    fn write_line(&mut self, s: impl AsRef<str>) {
        let _ = self.write_all(s.as_ref().as_bytes());
        let _ = self.write_all(b"\n");
        self.flush_ext()
    }

    fn flush_ext(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_line_appends_newline() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_line("OK|done");

        assert_eq!(buf, b"OK|done\n");
    }

    #[test]
    fn write_str_writes_raw_bytes() {
        let mut buf: Vec<u8> = Vec::new();
        buf.write_str("READY");

        assert_eq!(buf, b"READY");
    }
}
