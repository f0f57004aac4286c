//! Host block to engine sub-block adaptation.
//!
//! Hosts hand over one slice per channel and a block of `num_samples`
//! frames. The engine ticks in fixed sub-blocks over frame-interleaved
//! buffers. [`AudioBridge::process`] splits the host block into sub-blocks,
//! interleaves each one into a scratch buffer, ticks the engine once, and
//! scatters the result back into the host channels.

use patchhost_core::PatchEngine;

use crate::error::{Error, Result};

/// Audio adapter for one engine instance.
///
/// Scratch buffers are sized in `prepare`; `process` never allocates.
pub struct AudioBridge {
    sub_block: usize,
    inputs: usize,
    outputs: usize,
    max_block: usize,
    sample_rate: f64,
    input_buf: Vec<f32>,
    output_buf: Vec<f32>,
}

impl AudioBridge {
    pub fn new(sub_block: usize) -> Self {
        Self {
            sub_block: sub_block.max(1),
            inputs: 0,
            outputs: 0,
            max_block: 0,
            sample_rate: 0.0,
            input_buf: Vec::new(),
            output_buf: Vec::new(),
        }
    }

    /// Size the scratch buffers for `inputs` x `outputs` channels.
    ///
    /// `max_block` must be a non-zero multiple of the sub-block size.
    pub fn prepare(
        &mut self,
        inputs: usize,
        outputs: usize,
        max_block: usize,
        sample_rate: f64,
        max_channels: usize,
    ) -> Result<()> {
        if inputs > max_channels {
            return Err(Error::ChannelCount {
                direction: "input",
                count: inputs,
                max: max_channels,
            });
        }
        if outputs > max_channels {
            return Err(Error::ChannelCount {
                direction: "output",
                count: outputs,
                max: max_channels,
            });
        }
        if self.sub_blocks(max_block).is_none() {
            return Err(Error::BlockSize {
                block_size: max_block,
                sub_block: self.sub_block,
            });
        }

        self.inputs = inputs;
        self.outputs = outputs;
        self.max_block = max_block;
        self.sample_rate = sample_rate;
        self.input_buf = vec![0.0; self.sub_block * inputs];
        self.output_buf = vec![0.0; self.sub_block * outputs];
        Ok(())
    }

    /// Drop the scratch buffers.
    pub fn release(&mut self) {
        self.max_block = 0;
        self.input_buf = Vec::new();
        self.output_buf = Vec::new();
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.max_block > 0
    }

    #[inline]
    pub fn sub_block(&self) -> usize {
        self.sub_block
    }

    #[inline]
    pub fn channels(&self) -> (usize, usize) {
        (self.inputs, self.outputs)
    }

    #[inline]
    pub fn max_block(&self) -> usize {
        self.max_block
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of sub-block ticks for a host block, or `None` if the block is
    /// empty or not a whole number of sub-blocks.
    #[inline]
    pub fn sub_blocks(&self, num_samples: usize) -> Option<usize> {
        if num_samples == 0 || num_samples % self.sub_block != 0 {
            None
        } else {
            Some(num_samples / self.sub_block)
        }
    }

    /// Check a host block against the prepared layout without touching the
    /// engine.
    pub fn check_block(
        &self,
        num_samples: usize,
        inputs: &[&[f32]],
        outputs: &[&mut [f32]],
    ) -> Result<usize> {
        let ticks = self.sub_blocks(num_samples).ok_or(Error::BlockSize {
            block_size: num_samples,
            sub_block: self.sub_block,
        })?;
        if num_samples > self.max_block {
            return Err(Error::BlockSize {
                block_size: num_samples,
                sub_block: self.sub_block,
            });
        }
        for (channel, input) in inputs.iter().take(self.inputs).enumerate() {
            if input.len() < num_samples {
                return Err(Error::BufferTooShort {
                    direction: "input",
                    channel,
                    len: input.len(),
                    needed: num_samples,
                });
            }
        }
        for (channel, output) in outputs.iter().enumerate() {
            if output.len() < num_samples {
                return Err(Error::BufferTooShort {
                    direction: "output",
                    channel,
                    len: output.len(),
                    needed: num_samples,
                });
            }
        }
        Ok(ticks)
    }

    /// Run one host block through the engine.
    ///
    /// `before_tick(engine, start, end)` runs ahead of each sub-block tick
    /// with the frame range that tick covers. Missing input channels read as
    /// silence; host output channels past the prepared count are zeroed.
    /// Returns the number of ticks performed.
    pub fn process<E: PatchEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        num_samples: usize,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        mut before_tick: impl FnMut(&mut E, usize, usize),
    ) -> Result<usize> {
        let ticks = self.check_block(num_samples, inputs, outputs)?;
        let sub = self.sub_block;

        for tick in 0..ticks {
            let start = tick * sub;
            let end = start + sub;

            self.deinterleave(inputs, start);
            before_tick(engine, start, end);
            engine.process_float(1, &self.input_buf, &mut self.output_buf)?;
            self.interleave_out(outputs, start);
        }

        for output in outputs.iter_mut().skip(self.outputs) {
            output[..num_samples].fill(0.0);
        }
        Ok(ticks)
    }

    fn deinterleave(&mut self, inputs: &[&[f32]], start: usize) {
        let ins = self.inputs;
        for frame in 0..self.sub_block {
            for ch in 0..ins {
                self.input_buf[frame * ins + ch] = inputs
                    .get(ch)
                    .map_or(0.0, |input| input[start + frame]);
            }
        }
    }

    fn interleave_out(&self, outputs: &mut [&mut [f32]], start: usize) {
        let outs = self.outputs;
        for (ch, output) in outputs.iter_mut().take(outs).enumerate() {
            for frame in 0..self.sub_block {
                output[start + frame] = self.output_buf[frame * outs + ch];
            }
        }
    }
}

/// Zero every host output channel for `num_samples` frames (clamped to each
/// buffer's length).
pub fn write_silence(outputs: &mut [&mut [f32]], num_samples: usize) {
    for output in outputs.iter_mut() {
        let n = num_samples.min(output.len());
        output[..n].fill(0.0);
    }
}
