use std::io::{Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::error::{Result, TraceError};
use super::model::SampleArray;

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";
/// Total header size (magic through newline) is padded to this many bytes.
const NPY_ALIGN: usize = 64;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the samples of a trace. Dispatch by extension.
///
/// * `.npy` – NumPy array file, 1-D, integer or float dtype
/// * `.bin` – headerless little-endian `f64` values
pub fn load_samples(path: &Path) -> Result<SampleArray> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let bytes = std::fs::read(path).map_err(|e| TraceError::io(path, e))?;
    match ext.as_str() {
        "npy" => decode_npy(&bytes).map_err(|reason| TraceError::sample_format(path, reason)),
        "bin" => decode_raw(&bytes).map_err(|reason| TraceError::sample_format(path, reason)),
        other => Err(TraceError::sample_format(
            path,
            format!("unknown extension '.{other}'"),
        )),
    }
}

/// Write `samples` as a version 1.0 `.npy` file with `<f8` dtype.
pub fn write_npy<W: Write>(mut out: W, samples: &[f64]) -> std::io::Result<()> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        samples.len()
    );
    // magic + version + header_len field + dict + '\n'
    let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
    let pad = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    let header_len = u16::try_from(dict.len() + pad + 1)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "npy header too long"))?;

    out.write_all(NPY_MAGIC)?;
    out.write_all(&[1, 0])?;
    out.write_u16::<LittleEndian>(header_len)?;
    out.write_all(dict.as_bytes())?;
    out.write_all(" ".repeat(pad).as_bytes())?;
    out.write_all(b"\n")?;
    for &v in samples {
        out.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F8,
    F4,
    I2,
    I4,
    I8,
}

impl Dtype {
    fn size(self) -> usize {
        match self {
            Dtype::I2 => 2,
            Dtype::F4 | Dtype::I4 => 4,
            Dtype::F8 | Dtype::I8 => 8,
        }
    }
}

fn decode_npy(mut buf: &[u8]) -> Result<SampleArray, String> {
    let mut magic = [0u8; 6];
    buf.read_exact(&mut magic)
        .map_err(|_| "file too short for npy magic".to_string())?;
    if &magic != NPY_MAGIC {
        return Err("missing npy magic string".into());
    }

    let major = buf.read_u8().map_err(|e| e.to_string())?;
    let _minor = buf.read_u8().map_err(|e| e.to_string())?;
    let header_len = match major {
        1 => buf.read_u16::<LittleEndian>().map_err(|e| e.to_string())? as usize,
        2 | 3 => buf.read_u32::<LittleEndian>().map_err(|e| e.to_string())? as usize,
        v => return Err(format!("unsupported npy version {v}")),
    };
    if buf.len() < header_len {
        return Err("truncated npy header".into());
    }
    let (header, data) = buf.split_at(header_len);
    let header = std::str::from_utf8(header).map_err(|_| "npy header is not text".to_string())?;

    let (endian, dtype) = parse_descr(header_field(header, "descr").ok_or("missing 'descr'")?)?;
    match header_field(header, "fortran_order") {
        Some("False") => {}
        Some(other) => return Err(format!("fortran_order {other} is not supported")),
        None => return Err("missing 'fortran_order'".into()),
    }
    let len = parse_shape(header_field(header, "shape").ok_or("missing 'shape'")?)?;

    let expected = len
        .checked_mul(dtype.size())
        .ok_or_else(|| format!("shape ({len},) is too large"))?;
    if data.len() != expected {
        return Err(format!(
            "expected {expected} data bytes for {len} values, found {}",
            data.len()
        ));
    }

    Ok(match endian {
        Endian::Little => decode_values::<LittleEndian>(dtype, data, len),
        Endian::Big => decode_values::<BigEndian>(dtype, data, len),
    })
}

fn decode_raw(data: &[u8]) -> Result<SampleArray, String> {
    if data.len() % 8 != 0 {
        return Err(format!("size {} is not a multiple of 8", data.len()));
    }
    Ok(decode_values::<LittleEndian>(Dtype::F8, data, data.len() / 8))
}

fn decode_values<B: ByteOrder>(dtype: Dtype, data: &[u8], len: usize) -> SampleArray {
    match dtype {
        Dtype::F8 => {
            let mut out = vec![0.0; len];
            B::read_f64_into(data, &mut out);
            out
        }
        Dtype::F4 => {
            let mut tmp = vec![0.0f32; len];
            B::read_f32_into(data, &mut tmp);
            tmp.into_iter().map(f64::from).collect()
        }
        Dtype::I2 => {
            let mut tmp = vec![0i16; len];
            B::read_i16_into(data, &mut tmp);
            tmp.into_iter().map(f64::from).collect()
        }
        Dtype::I4 => {
            let mut tmp = vec![0i32; len];
            B::read_i32_into(data, &mut tmp);
            tmp.into_iter().map(f64::from).collect()
        }
        Dtype::I8 => {
            let mut tmp = vec![0i64; len];
            B::read_i64_into(data, &mut tmp);
            tmp.into_iter().map(|v| v as f64).collect()
        }
    }
}

/// Raw text of a value in the header dict, e.g. `'<f8'`, `False`, `(10,)`.
fn header_field<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{key}':");
    let start = header.find(&needle)? + needle.len();
    let rest = header[start..].trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')')? + 1
    } else if let Some(quoted) = rest.strip_prefix('\'') {
        quoted.find('\'')? + 2
    } else {
        rest.find([',', '}'])?
    };
    Some(rest[..end].trim())
}

/// Unprefixed and `|`/`=` descriptors are read as little-endian, which is what
/// the exporter produces on every platform it ships for.
fn parse_descr(raw: &str) -> Result<(Endian, Dtype), String> {
    let descr = raw.trim_matches('\'');
    let (endian, code) = match descr.as_bytes().first() {
        Some(b'<') | Some(b'|') | Some(b'=') => (Endian::Little, &descr[1..]),
        Some(b'>') => (Endian::Big, &descr[1..]),
        _ => (Endian::Little, descr),
    };
    let dtype = match code {
        "f8" => Dtype::F8,
        "f4" => Dtype::F4,
        "i2" => Dtype::I2,
        "i4" => Dtype::I4,
        "i8" => Dtype::I8,
        other => return Err(format!("unsupported dtype '{other}'")),
    };
    Ok((endian, dtype))
}

fn parse_shape(raw: &str) -> Result<usize, String> {
    let inner = raw
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| format!("malformed shape {raw}"))?;
    let dims: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match dims.as_slice() {
        [n] => n
            .parse::<usize>()
            .map_err(|_| format!("malformed shape {raw}")),
        _ => Err(format!("expected a 1-D array, shape is {raw}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npy_bytes(descr: &str, shape: &str, data: &[u8]) -> Vec<u8> {
        let dict = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}\n");
        let mut out = Vec::new();
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.write_u16::<LittleEndian>(dict.len() as u16).unwrap();
        out.extend_from_slice(dict.as_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn written_header_is_aligned_and_readable() {
        let samples = [1.5, -2.0, 3.25];
        let mut buf = Vec::new();
        write_npy(&mut buf, &samples).unwrap();

        let header_end = buf.len() - samples.len() * 8;
        assert_eq!(header_end % NPY_ALIGN, 0);
        assert_eq!(buf[header_end - 1], b'\n');
        assert_eq!(decode_npy(&buf).unwrap(), samples.to_vec());
    }

    #[test]
    fn reads_native_order_f8_as_exported() {
        let mut data = Vec::new();
        for v in [0.5f64, 1.0] {
            data.write_f64::<LittleEndian>(v).unwrap();
        }
        let buf = npy_bytes("f8", "(2,)", &data);
        assert_eq!(decode_npy(&buf).unwrap(), vec![0.5, 1.0]);
    }

    #[test]
    fn converts_other_dtypes() {
        let mut data = Vec::new();
        for v in [-3i16, 7] {
            data.write_i16::<LittleEndian>(v).unwrap();
        }
        assert_eq!(
            decode_npy(&npy_bytes("<i2", "(2,)", &data)).unwrap(),
            vec![-3.0, 7.0]
        );

        let mut data = Vec::new();
        data.write_f32::<BigEndian>(2.5).unwrap();
        assert_eq!(
            decode_npy(&npy_bytes(">f4", "(1,)", &data)).unwrap(),
            vec![2.5]
        );
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(decode_npy(b"NOTNPY").is_err());
        assert!(decode_npy(&npy_bytes("<c16", "(1,)", &[0; 16])).is_err());
        assert!(decode_npy(&npy_bytes("<f8", "(2, 2)", &[0; 32])).is_err());
        // data length disagrees with shape
        assert!(decode_npy(&npy_bytes("<f8", "(3,)", &[0; 16])).is_err());
    }

    #[test]
    fn oversized_shape_is_rejected() {
        // 2^61 + 1 values of 8 bytes wraps to 8 bytes in usize arithmetic
        let buf = npy_bytes("<f8", "(2305843009213693953,)", &[0; 8]);
        let err = decode_npy(&buf).unwrap_err();
        assert!(err.contains("too large"), "{err}");
    }

    #[test]
    fn empty_array_round_trips() {
        let mut buf = Vec::new();
        write_npy(&mut buf, &[]).unwrap();
        assert_eq!(decode_npy(&buf).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn raw_bin_requires_whole_values() {
        let mut data = Vec::new();
        data.write_f64::<LittleEndian>(4.0).unwrap();
        assert_eq!(decode_raw(&data).unwrap(), vec![4.0]);
        assert!(decode_raw(&data[..5]).is_err());
    }

    #[test]
    fn load_samples_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PM_1_1_1_A.txt");
        std::fs::write(&path, b"1 2 3").unwrap();
        match load_samples(&path) {
            Err(TraceError::SampleFormat { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
    }
}
