//! Upload validation: extension allow-list and file-name sanitising.
//!
//! Validation runs before anything touches the disk or a capability. A
//! rejected upload is not an error page; the pipeline just produces an empty
//! message (see [`crate::error::RejectReason`]).

use crate::error::RejectReason;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

/// An uploaded file as received from the client.
#[derive(Clone)]
pub struct UploadedImage {
    /// File name as sent by the client; may contain anything.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedImage")
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// An upload that passed validation.
#[derive(Debug)]
pub struct ValidatedUpload {
    pub sanitized_name: String,
    /// Lowercased extension, without the dot.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Lowercased suffix after the last `.`, if any.
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// True when `filename` contains a `.` and its lowercased suffix after the
/// last `.` is in `allowed`.
pub fn allowed_file(filename: &str, allowed: &BTreeSet<String>) -> bool {
    extension(filename).is_some_and(|ext| allowed.contains(&ext))
}

static RE_UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// ASCII spelling of a Latin-1 or Latin Extended-A letter, if it has one.
fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à'..='å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ð' | 'Ď' | 'Đ' => "D",
        'ð' | 'ď' | 'đ' => "d",
        'È'..='Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ğ' => "G",
        'ğ' => "g",
        'Ì'..='Ï' | 'Ī' | 'Į' | 'İ' => "I",
        'ì'..='ï' | 'ī' | 'į' | 'ı' => "i",
        'Ł' | 'Ľ' => "L",
        'ł' | 'ľ' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Ş' | 'Š' => "S",
        'ś' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'Ţ' | 'Ť' => "T",
        'ţ' | 'ť' => "t",
        'Þ' => "TH",
        'þ' => "th",
        'Ù'..='Ü' | 'Ū' | 'Ů' | 'Ű' | 'Ų' => "U",
        'ù'..='ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Replace accented Latin letters with their ASCII spelling.
fn fold_accents(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match fold_accent(c) {
            Some(ascii) => out.push_str(ascii),
            None => out.push(c),
        }
    }
    out
}

/// Reduce a client-supplied name to a safe, flat file name.
///
/// Keeps only the final path component, joins whitespace-separated words
/// with `_`, folds accented Latin letters to ASCII (`été` becomes `ete`),
/// drops every remaining character outside `[A-Za-z0-9_.-]` and trims
/// leading/trailing `.` and `_`. Returns `None` when nothing is left.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let folded = fold_accents(&joined);
    let cleaned = RE_UNSAFE_CHARS.replace_all(&folded, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decide whether an upload enters the pipeline.
pub fn validate_upload(
    upload: Option<UploadedImage>,
    allowed: &BTreeSet<String>,
) -> Result<ValidatedUpload, RejectReason> {
    let upload = upload.ok_or(RejectReason::MissingFile)?;
    if upload.filename.trim().is_empty() {
        return Err(RejectReason::EmptyFilename);
    }
    if !allowed_file(&upload.filename, allowed) {
        return Err(RejectReason::DisallowedExtension {
            filename: upload.filename,
        });
    }
    let sanitized_name = sanitize_filename(&upload.filename).ok_or(RejectReason::EmptyFilename)?;
    let extension = extension(&upload.filename).unwrap_or_default();

    Ok(ValidatedUpload {
        sanitized_name,
        extension,
        bytes: upload.bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> BTreeSet<String> {
        ["png", "jpg", "jpeg"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_allowed_file() {
        let a = allowed();
        assert!(allowed_file("receipt.png", &a));
        assert!(allowed_file("RECEIPT.PNG", &a));
        assert!(allowed_file("archive.tar.jpg", &a));
        assert!(!allowed_file("notes.txt", &a));
        assert!(!allowed_file("png", &a));
        assert!(!allowed_file("image.png.exe", &a));
        assert!(!allowed_file("", &a));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("receipt.png").as_deref(), Some("receipt.png"));
        assert_eq!(
            sanitize_filename("../../etc/passwd.png").as_deref(),
            Some("passwd.png")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\my photo.jpg").as_deref(),
            Some("my_photo.jpg")
        );
        assert_eq!(sanitize_filename("été.png").as_deref(), Some("ete.png"));
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn test_validate_upload() {
        let a = allowed();
        let ok = validate_upload(Some(UploadedImage::new("Receipt.PNG", b"x".to_vec())), &a)
            .expect("should pass");
        assert_eq!(ok.extension, "png");
        assert_eq!(ok.sanitized_name, "Receipt.PNG");

        assert_eq!(validate_upload(None, &a).unwrap_err(), RejectReason::MissingFile);
        assert_eq!(
            validate_upload(Some(UploadedImage::new("", b"x".to_vec())), &a).unwrap_err(),
            RejectReason::EmptyFilename
        );
        assert_eq!(
            validate_upload(Some(UploadedImage::new("notes.txt", b"x".to_vec())), &a)
                .unwrap_err(),
            RejectReason::DisallowedExtension {
                filename: "notes.txt".into()
            }
        );
    }

    #[test]
    fn accented_latin_names_keep_their_letters() {
        assert_eq!(
            sanitize_filename("Crème brûlée.jpg").as_deref(),
            Some("Creme_brulee.jpg")
        );
        assert_eq!(
            sanitize_filename("Straße_Ærø.png").as_deref(),
            Some("Strasse_AEro.png")
        );
        assert_eq!(
            sanitize_filename("uploads/Ñandú.JPEG").as_deref(),
            Some("Nandu.JPEG")
        );
    }

    #[test]
    fn non_ascii_names_are_reduced() {
        let a = allowed();
        assert_eq!(
            validate_upload(Some(UploadedImage::new("日本.png", b"x".to_vec())), &a)
                .map(|v| v.sanitized_name),
            Ok("png".to_string())
        );
        assert_eq!(
            validate_upload(Some(UploadedImage::new("._.png", b"x".to_vec())), &a)
                .map(|v| v.sanitized_name),
            Ok("png".to_string())
        );
    }
}
