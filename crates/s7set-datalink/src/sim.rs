use crate::{S7Service, ServiceError};
use s7set_core::encoding::Writer;
use s7set_core::pdu::{
    Area, Function, Message, ReturnCode, SetupCommunication, WriteVarRequest, WriteVarResponse,
};
use s7set_core::EncodeError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// PDU size offered by small S7-300/1200 CPUs.
pub const DEFAULT_PDU_LENGTH: u16 = 240;

/// An S7 endpoint that keeps data blocks in memory.
#[derive(Debug)]
pub struct InMemoryS7Service {
    data_blocks: RwLock<BTreeMap<u16, Vec<u8>>>,
    pdu_length: u16,
    write_jobs: AtomicUsize,
}

impl Default for InMemoryS7Service {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryS7Service {
    pub fn new() -> Self {
        Self::with_pdu_length(DEFAULT_PDU_LENGTH)
    }

    pub fn with_pdu_length(pdu_length: u16) -> Self {
        Self {
            data_blocks: RwLock::new(BTreeMap::new()),
            pdu_length,
            write_jobs: AtomicUsize::new(0),
        }
    }

    pub fn with_data_block(self, db_number: u16, size: usize) -> Self {
        self.add_data_block(db_number, size);
        self
    }

    pub fn add_data_block(&self, db_number: u16, size: usize) {
        self.data_blocks
            .write()
            .expect("in-memory data block lock poisoned")
            .insert(db_number, vec![0u8; size]);
    }

    pub fn data_block(&self, db_number: u16) -> Option<Vec<u8>> {
        self.data_blocks
            .read()
            .expect("in-memory data block lock poisoned")
            .get(&db_number)
            .cloned()
    }

    /// Number of write var jobs received, successful or not.
    pub fn write_jobs(&self) -> usize {
        self.write_jobs.load(Ordering::Relaxed)
    }

    fn write(&self, request: &WriteVarRequest<'_>) -> ReturnCode {
        if request.address.area != Area::DataBlocks {
            return ReturnCode::AccessDenied;
        }

        let mut blocks = self
            .data_blocks
            .write()
            .expect("in-memory data block lock poisoned");
        let Some(block) = blocks.get_mut(&request.address.db_number) else {
            return ReturnCode::ObjectDoesNotExist;
        };

        let start = request.address.start_byte() as usize;
        let Some(slot) = block.get_mut(start..start + request.data.len()) else {
            return ReturnCode::InvalidAddress;
        };
        slot.copy_from_slice(request.data);
        ReturnCode::Success
    }
}

fn map_encode(_: EncodeError) -> ServiceError {
    ServiceError::Internal("response buffer too small")
}

impl S7Service for InMemoryS7Service {
    fn handle(&self, request: Message<'_>, response_pdu: &mut [u8]) -> Result<usize, ServiceError> {
        let pdu_ref = request.header.pdu_ref;
        let mut w = Writer::new(response_pdu);

        match request
            .function()
            .map_err(|_| ServiceError::InvalidRequest("missing function code"))?
        {
            Function::SetupCommunication => {
                let requested = SetupCommunication::from_message(&request)
                    .map_err(|_| ServiceError::InvalidRequest("malformed setup communication"))?;
                let negotiated = SetupCommunication {
                    pdu_length: requested.pdu_length.min(self.pdu_length),
                    ..requested
                };
                negotiated
                    .encode_response(&mut w, pdu_ref)
                    .map_err(map_encode)?;
            }
            Function::WriteVar => {
                let write = WriteVarRequest::from_message(&request)
                    .map_err(|_| ServiceError::InvalidRequest("malformed write var"))?;
                self.write_jobs.fetch_add(1, Ordering::Relaxed);
                let return_code = self.write(&write);
                WriteVarResponse { return_code }
                    .encode(&mut w, pdu_ref)
                    .map_err(map_encode)?;
            }
            _ => return Err(ServiceError::InvalidRequest("unsupported function")),
        }

        Ok(w.position())
    }
}
