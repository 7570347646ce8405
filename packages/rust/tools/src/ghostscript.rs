//! Ghostscript preview compression.

use std::ffi::OsString;
use std::path::Path;

/// Fixed preview profile: ebook-quality images, PDF 1.4, batch mode.
pub const PREVIEW_FLAGS: [&str; 6] = [
    "-sDEVICE=pdfwrite",
    "-dCompatibilityLevel=1.4",
    "-dPDFSETTINGS=/ebook",
    "-dNOPAUSE",
    "-dQUIET",
    "-dBATCH",
];

/// Full argument list compressing `src` into `dst`.
pub fn preview_args(src: &Path, dst: &Path) -> Vec<OsString> {
    let mut output = OsString::from("-sOutputFile=");
    output.push(dst);

    let mut args: Vec<OsString> = PREVIEW_FLAGS.iter().map(OsString::from).collect();
    args.push(output);
    args.push(src.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_flag_precedes_input() {
        let args = preview_args(Path::new("in.pdf"), Path::new("out dir/preview.pdf"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(&args[..6], &PREVIEW_FLAGS);
        assert_eq!(args[6], "-sOutputFile=out dir/preview.pdf");
        assert_eq!(args[7], "in.pdf");
        assert_eq!(args.len(), 8);
    }
}
