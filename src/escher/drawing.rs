//! Drawing bookkeeping records: Dg (per drawing) and Dgg (per document).

use super::context::DecodeContext;
use super::header::{HEADER_SIZE, RecordHeader};
use super::record::{Record, fixed_body, full_body};
use super::types::EscherRecordType;
use crate::common::binary::{ByteWriter, read_u32_le};
use crate::common::error::{DecodeError, DecodeWarning, EncodeResult, Result};
use tracing::warn;

/// Drawing atom (0xF008).
///
/// The drawing group id is the header instance; only the shape counters are
/// stored in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DgRecord {
    version: u8,
    drawing_group_id: u16,
    num_shapes: u32,
    last_shape_id: u32,
}

impl DgRecord {
    const BODY_SIZE: usize = 8;

    pub fn new(drawing_group_id: u16, num_shapes: u32, last_shape_id: u32) -> Self {
        Self {
            version: 0x00,
            drawing_group_id: drawing_group_id & 0x0FFF,
            num_shapes,
            last_shape_id,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let body = fixed_body(data, offset, header, &[Self::BODY_SIZE])?;
        let record = Self {
            version: header.version,
            drawing_group_id: header.instance,
            num_shapes: read_u32_le(body, 0)?,
            last_shape_id: read_u32_le(body, 4)?,
        };
        Ok((record, HEADER_SIZE + Self::BODY_SIZE))
    }

    #[inline]
    pub fn drawing_group_id(&self) -> u16 {
        self.drawing_group_id
    }

    pub fn set_drawing_group_id(&mut self, id: u16) {
        self.drawing_group_id = id & 0x0FFF;
    }

    #[inline]
    pub fn num_shapes(&self) -> u32 {
        self.num_shapes
    }

    pub fn set_num_shapes(&mut self, num_shapes: u32) {
        self.num_shapes = num_shapes;
    }

    #[inline]
    pub fn last_shape_id(&self) -> u32 {
        self.last_shape_id
    }

    pub fn set_last_shape_id(&mut self, last_shape_id: u32) {
        self.last_shape_id = last_shape_id;
    }
}

impl Record for DgRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::Dg as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.drawing_group_id
    }

    fn body_size(&self) -> usize {
        Self::BODY_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_u32(self.num_shapes)?;
        writer.put_u32(self.last_shape_id)
    }
}

/// Shape id block reserved by one drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdCluster {
    pub drawing_group_id: u32,
    pub num_shape_ids_used: u32,
}

impl FileIdCluster {
    pub const fn new(drawing_group_id: u32, num_shape_ids_used: u32) -> Self {
        Self {
            drawing_group_id,
            num_shape_ids_used,
        }
    }
}

/// Drawing group atom (0xF006).
///
/// The on-disk cluster count is one more than the number of clusters stored.
/// A stale count read from disk is kept until the clusters are edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DggRecord {
    version: u8,
    instance: u16,
    pub shape_id_max: u32,
    pub num_shapes_saved: u32,
    pub drawings_saved: u32,
    clusters: Vec<FileIdCluster>,
    stale_cluster_count: Option<u32>,
}

impl DggRecord {
    const FIXED_SIZE: usize = 16;
    const CLUSTER_SIZE: usize = 8;

    pub fn new(shape_id_max: u32, num_shapes_saved: u32, drawings_saved: u32) -> Self {
        Self {
            version: 0x00,
            instance: 0,
            shape_id_max,
            num_shapes_saved,
            drawings_saved,
            clusters: Vec::new(),
            stale_cluster_count: None,
        }
    }

    pub(crate) fn decode(
        data: &[u8],
        offset: usize,
        header: &RecordHeader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(Self, usize)> {
        let declared = header.length as usize;
        if declared < Self::FIXED_SIZE || (declared - Self::FIXED_SIZE) % Self::CLUSTER_SIZE != 0 {
            return Err(DecodeError::malformed(
                header.record_id,
                offset,
                format!("Dgg body length {declared} is not 16 + 8n"),
            ));
        }
        let body = full_body(data, offset, header)?;

        let cluster_field = read_u32_le(body, 4)?;
        let n = (declared - Self::FIXED_SIZE) / Self::CLUSTER_SIZE;
        let expected = n as u32 + 1;
        let stale_cluster_count = (cluster_field != expected).then(|| {
            warn!(
                record_id = header.record_id,
                offset,
                stored = cluster_field,
                expected,
                "Dgg cluster count disagrees with the clusters stored"
            );
            ctx.warn(DecodeWarning::CountMismatch {
                record_id: header.record_id,
                offset,
                stored: cluster_field,
                expected,
            });
            cluster_field
        });

        let mut clusters = Vec::with_capacity(n);
        for i in 0..n {
            let pos = Self::FIXED_SIZE + i * Self::CLUSTER_SIZE;
            clusters.push(FileIdCluster::new(
                read_u32_le(body, pos)?,
                read_u32_le(body, pos + 4)?,
            ));
        }

        let record = Self {
            version: header.version,
            instance: header.instance,
            shape_id_max: read_u32_le(body, 0)?,
            num_shapes_saved: read_u32_le(body, 8)?,
            drawings_saved: read_u32_le(body, 12)?,
            clusters,
            stale_cluster_count,
        };
        Ok((record, HEADER_SIZE + declared))
    }

    #[inline]
    pub fn clusters(&self) -> &[FileIdCluster] {
        &self.clusters
    }

    pub fn set_clusters(&mut self, clusters: Vec<FileIdCluster>) {
        self.clusters = clusters;
        self.stale_cluster_count = None;
    }

    pub fn add_cluster(&mut self, drawing_group_id: u32, num_shape_ids_used: u32) {
        self.clusters
            .push(FileIdCluster::new(drawing_group_id, num_shape_ids_used));
        self.stale_cluster_count = None;
    }

    /// Cluster count as written on disk (clusters + 1 unless a stale value
    /// was decoded and the clusters are untouched).
    #[inline]
    pub fn num_id_clusters(&self) -> u32 {
        self.stale_cluster_count
            .unwrap_or(self.clusters.len() as u32 + 1)
    }
}

impl Record for DggRecord {
    fn record_id(&self) -> u16 {
        EscherRecordType::Dgg as u16
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn instance(&self) -> u16 {
        self.instance
    }

    fn body_size(&self) -> usize {
        Self::FIXED_SIZE + self.clusters.len() * Self::CLUSTER_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> EncodeResult<()> {
        writer.put_u32(self.shape_id_max)?;
        writer.put_u32(self.num_id_clusters())?;
        writer.put_u32(self.num_shapes_saved)?;
        writer.put_u32(self.drawings_saved)?;
        for cluster in &self.clusters {
            writer.put_u32(cluster.drawing_group_id)?;
            writer.put_u32(cluster.num_shape_ids_used)?;
        }
        Ok(())
    }
}
