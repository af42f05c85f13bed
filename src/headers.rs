//! The four fixed structures of a ZIP archive, per PKZIP APPNOTE v2.0.
//!
//! No ZIP64, no encryption, no multi-disk: the archive layout is
//! `[local header | payload | data descriptor?]* [central directory header]*
//! [end of central directory]`.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::codec::{bad_signature, Record};
use crate::error::Result;

/// Local file header signature
pub(crate) const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Data descriptor signature
pub(crate) const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

/// Central directory header signature
pub(crate) const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;

/// End of central directory signature
pub(crate) const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

/// General purpose bit 3: sizes and CRC are zero in the local header and
/// live in a data descriptor after the payload.
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// General purpose bit 11: the filename bytes are UTF-8 rather than CP437.
pub(crate) const FLAG_UTF8: u16 = 1 << 11;

/// Header preceding each entry's payload.
#[derive(Debug, Clone)]
pub(crate) struct LocalFileHeader {
    pub version_needed_to_extract: u16,
    pub general_purpose_bit_flag: u16,
    pub compression_method: u16,
    pub last_mod_file_time: u16,
    pub last_mod_file_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: Vec<u8>,
    pub extra_field: Vec<u8>,
}

impl LocalFileHeader {
    /// On-disk size including the variable regions.
    pub(crate) fn total_size(&self) -> u64 {
        (Self::FIXED_SIZE + self.file_name.len() + self.extra_field.len()) as u64
    }
}

impl Record for LocalFileHeader {
    const FIXED_SIZE: usize = 30;

    fn parse<F>(fixed: &[u8], mut tail: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Vec<u8>>,
    {
        let mut c = Cursor::new(fixed);
        if c.read_u32::<LittleEndian>()? != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(bad_signature("local file header"));
        }
        let version_needed_to_extract = c.read_u16::<LittleEndian>()?;
        let general_purpose_bit_flag = c.read_u16::<LittleEndian>()?;
        let compression_method = c.read_u16::<LittleEndian>()?;
        let last_mod_file_time = c.read_u16::<LittleEndian>()?;
        let last_mod_file_date = c.read_u16::<LittleEndian>()?;
        let crc32 = c.read_u32::<LittleEndian>()?;
        let compressed_size = c.read_u32::<LittleEndian>()?;
        let uncompressed_size = c.read_u32::<LittleEndian>()?;
        let file_name_length = c.read_u16::<LittleEndian>()? as usize;
        let extra_field_length = c.read_u16::<LittleEndian>()? as usize;
        let file_name = tail(file_name_length)?;
        let extra_field = tail(extra_field_length)?;
        Ok(Self {
            version_needed_to_extract,
            general_purpose_bit_flag,
            compression_method,
            last_mod_file_time,
            last_mod_file_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name,
            extra_field,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(Self::FIXED_SIZE + self.file_name.len() + self.extra_field.len());
        out.extend_from_slice(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version_needed_to_extract.to_le_bytes());
        out.extend_from_slice(&self.general_purpose_bit_flag.to_le_bytes());
        out.extend_from_slice(&self.compression_method.to_le_bytes());
        out.extend_from_slice(&self.last_mod_file_time.to_le_bytes());
        out.extend_from_slice(&self.last_mod_file_date.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(self.file_name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.extra_field.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.file_name);
        out.extend_from_slice(&self.extra_field);
        out
    }
}

/// Trailer written after a payload when the local header's sizes and CRC
/// were still unknown at write time (general purpose bit 3).
#[derive(Debug, Clone, Copy)]
pub(crate) struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl Record for DataDescriptor {
    const FIXED_SIZE: usize = 16;

    fn parse<F>(fixed: &[u8], _tail: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Vec<u8>>,
    {
        let mut c = Cursor::new(fixed);
        if c.read_u32::<LittleEndian>()? != DATA_DESCRIPTOR_SIGNATURE {
            return Err(bad_signature("data descriptor"));
        }
        Ok(Self {
            crc32: c.read_u32::<LittleEndian>()?,
            compressed_size: c.read_u32::<LittleEndian>()?,
            uncompressed_size: c.read_u32::<LittleEndian>()?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::FIXED_SIZE);
        out.extend_from_slice(&DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out
    }
}

/// One central directory record per entry; the authoritative metadata.
#[derive(Debug, Clone)]
pub(crate) struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed_to_extract: u16,
    pub general_purpose_bit_flag: u16,
    pub compression_method: u16,
    pub last_mod_file_time: u16,
    pub last_mod_file_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub disk_number_start: u16,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub relative_offset_of_local_header: u32,
    pub file_name: Vec<u8>,
    pub extra_field: Vec<u8>,
    pub file_comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    /// On-disk size including the variable regions; iteration advances by
    /// this amount.
    pub(crate) fn total_size(&self) -> u64 {
        (Self::FIXED_SIZE + self.file_name.len() + self.extra_field.len() + self.file_comment.len())
            as u64
    }

    pub(crate) fn has_data_descriptor(&self) -> bool {
        self.general_purpose_bit_flag & FLAG_DATA_DESCRIPTOR != 0
    }

    pub(crate) fn is_utf8(&self) -> bool {
        self.general_purpose_bit_flag & FLAG_UTF8 != 0
    }
}

impl Record for CentralDirectoryHeader {
    const FIXED_SIZE: usize = 46;

    fn parse<F>(fixed: &[u8], mut tail: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Vec<u8>>,
    {
        let mut c = Cursor::new(fixed);
        if c.read_u32::<LittleEndian>()? != CENTRAL_DIRECTORY_SIGNATURE {
            return Err(bad_signature("central directory header"));
        }
        let version_made_by = c.read_u16::<LittleEndian>()?;
        let version_needed_to_extract = c.read_u16::<LittleEndian>()?;
        let general_purpose_bit_flag = c.read_u16::<LittleEndian>()?;
        let compression_method = c.read_u16::<LittleEndian>()?;
        let last_mod_file_time = c.read_u16::<LittleEndian>()?;
        let last_mod_file_date = c.read_u16::<LittleEndian>()?;
        let crc32 = c.read_u32::<LittleEndian>()?;
        let compressed_size = c.read_u32::<LittleEndian>()?;
        let uncompressed_size = c.read_u32::<LittleEndian>()?;
        let file_name_length = c.read_u16::<LittleEndian>()? as usize;
        let extra_field_length = c.read_u16::<LittleEndian>()? as usize;
        let file_comment_length = c.read_u16::<LittleEndian>()? as usize;
        let disk_number_start = c.read_u16::<LittleEndian>()?;
        let internal_file_attributes = c.read_u16::<LittleEndian>()?;
        let external_file_attributes = c.read_u32::<LittleEndian>()?;
        let relative_offset_of_local_header = c.read_u32::<LittleEndian>()?;
        let file_name = tail(file_name_length)?;
        let extra_field = tail(extra_field_length)?;
        let file_comment = tail(file_comment_length)?;
        Ok(Self {
            version_made_by,
            version_needed_to_extract,
            general_purpose_bit_flag,
            compression_method,
            last_mod_file_time,
            last_mod_file_date,
            crc32,
            compressed_size,
            uncompressed_size,
            disk_number_start,
            internal_file_attributes,
            external_file_attributes,
            relative_offset_of_local_header,
            file_name,
            extra_field,
            file_comment,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_size() as usize);
        out.extend_from_slice(&CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version_made_by.to_le_bytes());
        out.extend_from_slice(&self.version_needed_to_extract.to_le_bytes());
        out.extend_from_slice(&self.general_purpose_bit_flag.to_le_bytes());
        out.extend_from_slice(&self.compression_method.to_le_bytes());
        out.extend_from_slice(&self.last_mod_file_time.to_le_bytes());
        out.extend_from_slice(&self.last_mod_file_date.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(self.file_name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.extra_field.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.file_comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.disk_number_start.to_le_bytes());
        out.extend_from_slice(&self.internal_file_attributes.to_le_bytes());
        out.extend_from_slice(&self.external_file_attributes.to_le_bytes());
        out.extend_from_slice(&self.relative_offset_of_local_header.to_le_bytes());
        out.extend_from_slice(&self.file_name);
        out.extend_from_slice(&self.extra_field);
        out.extend_from_slice(&self.file_comment);
        out
    }
}

/// The trailer anchoring the whole archive. A freshly created archive is
/// nothing but this record with every count zeroed.
#[derive(Debug, Clone, Default)]
pub(crate) struct EndOfCentralDirectoryRecord {
    pub number_of_disk: u16,
    pub number_of_disk_start: u16,
    pub total_number_of_entries_on_this_disk: u16,
    pub total_number_of_entries_in_central_directory: u16,
    pub size_of_central_directory: u32,
    pub offset_to_start_of_central_directory: u32,
    pub zip_file_comment: Vec<u8>,
}

impl Record for EndOfCentralDirectoryRecord {
    const FIXED_SIZE: usize = 22;

    fn parse<F>(fixed: &[u8], mut tail: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Vec<u8>>,
    {
        let mut c = Cursor::new(fixed);
        if c.read_u32::<LittleEndian>()? != END_OF_CENTRAL_DIRECTORY_SIGNATURE {
            return Err(bad_signature("end of central directory record"));
        }
        let number_of_disk = c.read_u16::<LittleEndian>()?;
        let number_of_disk_start = c.read_u16::<LittleEndian>()?;
        let total_number_of_entries_on_this_disk = c.read_u16::<LittleEndian>()?;
        let total_number_of_entries_in_central_directory = c.read_u16::<LittleEndian>()?;
        let size_of_central_directory = c.read_u32::<LittleEndian>()?;
        let offset_to_start_of_central_directory = c.read_u32::<LittleEndian>()?;
        let zip_file_comment_length = c.read_u16::<LittleEndian>()? as usize;
        let zip_file_comment = tail(zip_file_comment_length)?;
        Ok(Self {
            number_of_disk,
            number_of_disk_start,
            total_number_of_entries_on_this_disk,
            total_number_of_entries_in_central_directory,
            size_of_central_directory,
            offset_to_start_of_central_directory,
            zip_file_comment,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::FIXED_SIZE + self.zip_file_comment.len());
        out.extend_from_slice(&END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.number_of_disk.to_le_bytes());
        out.extend_from_slice(&self.number_of_disk_start.to_le_bytes());
        out.extend_from_slice(&self.total_number_of_entries_on_this_disk.to_le_bytes());
        out.extend_from_slice(
            &self
                .total_number_of_entries_in_central_directory
                .to_le_bytes(),
        );
        out.extend_from_slice(&self.size_of_central_directory.to_le_bytes());
        out.extend_from_slice(&self.offset_to_start_of_central_directory.to_le_bytes());
        out.extend_from_slice(&(self.zip_file_comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.zip_file_comment);
        out
    }
}
